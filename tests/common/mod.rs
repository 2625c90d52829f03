//! Shared fixture: a two-package Go workspace plus its rewrite plan.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const BILLING: &str = r#"package billing

import (
	"context"

	"encore.dev/storage/sqldb"
	"example.com/app/payments"
)

var secrets struct {
	StripeKey string
}

var db = sqldb.Named("billing")

func Settle(ctx context.Context, amount int) error {
	return payments.Charge(ctx, amount)
}
"#;

pub const PAYMENTS: &str = r#"package payments

import "context"

func Charge(ctx context.Context, amount int) error {
	return nil
}
"#;

pub fn span_of(source: &str, needle: &str) -> [usize; 2] {
    let start = source
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not in source"));
    [start, start + needle.len()]
}

/// Plan for the fixture; `call_kind` is the directive kind of the remote call.
pub fn plan(call_kind: &str) -> Value {
    let call = span_of(BILLING, "payments.Charge(ctx, amount)");
    let db = span_of(BILLING, "sqldb.Named(\"billing\")");
    let secrets = span_of(BILLING, "secrets struct {\n\tStripeKey string\n}");
    let def = span_of(
        PAYMENTS,
        "func Charge(ctx context.Context, amount int) error {\n\treturn nil\n}",
    );

    json!({
        "packages": [
            {
                "name": "billing",
                "import_path": "example.com/app/billing",
                "dir": "billing",
                "service": "billing",
                "secrets": ["StripeKey"],
                "files": [{
                    "path": "billing/billing.go",
                    "directives": [
                        {"kind": "secret_declaration", "span": secrets},
                        {"kind": "database_handle", "span": db},
                        {"kind": call_kind, "span": call, "target": "payments.Charge"}
                    ]
                }]
            },
            {
                "name": "payments",
                "import_path": "example.com/app/payments",
                "dir": "payments",
                "service": "payments",
                "files": [{
                    "path": "payments/payments.go",
                    "directives": [{"kind": "remote_call_definition", "span": def}]
                }]
            }
        ],
        "rpcs": [{
            "service": "payments",
            "name": "Charge",
            "package": "example.com/app/payments",
            "file": "payments/payments.go",
            "span": def,
            "signature": {
                "params": ["context.Context", "int"],
                "results": ["error"],
                "imports": ["context"]
            }
        }],
        "node_ids": [
            {"file": "billing/billing.go", "span": call, "id": 41},
            {"file": "payments/payments.go", "span": def, "id": 7}
        ]
    })
}

/// Write the sources and a plan into a fresh directory.
pub fn workspace(call_kind: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "billing/billing.go", BILLING);
    write(dir.path(), "payments/payments.go", PAYMENTS);
    write(
        dir.path(),
        "plan.json",
        &serde_json::to_string_pretty(&plan(call_kind)).unwrap(),
    );
    dir
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}
