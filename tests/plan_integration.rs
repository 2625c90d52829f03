//! Plan loading through rewriting and writing, against files on disk.

mod common;

use go_rewrite::{
    plan, rewrite_package, scan_markers, write_package, LineMarker, PlanError, RewriteConfig,
};
use std::fs;

const BILLING_REWRITTEN: &str = "package billing

import __encore_runtime \"encore.dev/runtime\"
/*line :3:1*/import (
\t\"context\"

\t\"encore.dev/storage/sqldb\"
\t
)

var secrets = struct {
\tStripeKey string
}{
\tStripeKey: __encore_runtime.LoadSecret(\"StripeKey\"),
}/*line :12:2*/

var db = sqldb.Named(\"billing\",/*line :14:22*/\"billing\")

func Settle(ctx context.Context, amount int) error {
\treturn __encore_payments_Charge(41, 7,/*line :17:25*/ctx, amount)
}
";

const BILLING_WRAPPERS: &str = "// Code generated by go-rewrite. DO NOT EDIT.

package billing

import (
\t__encore_runtime \"encore.dev/runtime\"
\t\"context\"
\tpayments \"example.com/app/payments\"
)

func __encore_payments_Charge(callID, rpcID uint64, p0 context.Context, p1 int) error {
\tdefer __encore_runtime.BeginCall(callID, rpcID, \"payments\", \"Charge\").Finish()
\treturn payments.Charge(p0, p1)
}
";

#[test]
fn rewrites_and_writes_every_package() {
    let dir = common::workspace("remote_call");
    let workspace = plan::load_from_path(dir.path().join("plan.json")).unwrap();
    let config = RewriteConfig::default();
    let out = dir.path().join("out");

    let billing = rewrite_package(&workspace.packages[0], &workspace.ids, &config).unwrap();
    assert_eq!(billing.files.len(), 1);
    assert_eq!(billing.files[0].contents, BILLING_REWRITTEN);
    assert_eq!(billing.files[0].removed_imports, vec!["example.com/app/payments"]);

    let overlays = write_package(&billing, &out.join("billing")).unwrap();
    assert_eq!(overlays.len(), 2);
    assert_eq!(overlays[0].original, dir.path().join("billing/billing.go"));
    assert_eq!(overlays[0].rewritten, out.join("billing/billing.go"));
    assert_eq!(
        overlays[1].original,
        dir.path().join("billing/encore_rpc_wrappers.go")
    );
    assert_eq!(
        fs::read_to_string(out.join("billing/billing.go")).unwrap(),
        BILLING_REWRITTEN
    );
    assert_eq!(
        fs::read_to_string(out.join("billing/encore_rpc_wrappers.go")).unwrap(),
        BILLING_WRAPPERS
    );

    // The definition site needs no edit; the file is still emitted.
    let payments = rewrite_package(&workspace.packages[1], &workspace.ids, &config).unwrap();
    assert_eq!(payments.files[0].contents, common::PAYMENTS);
    assert!(payments.wrappers.is_none());
}

#[test]
fn markers_point_back_to_original_positions() {
    let dir = common::workspace("remote_call");
    let workspace = plan::load_from_path(dir.path().join("plan.json")).unwrap();
    let rewrite =
        rewrite_package(&workspace.packages[0], &workspace.ids, &RewriteConfig::default()).unwrap();

    let markers: Vec<LineMarker> = scan_markers(&rewrite.files[0].contents)
        .into_iter()
        .map(|(_, marker)| marker)
        .collect();
    assert_eq!(
        markers,
        vec![
            LineMarker::new(3, 1),
            LineMarker::new(12, 2),
            LineMarker::new(14, 22),
            LineMarker::new(17, 25),
        ]
    );

    let original_lines: Vec<&str> = common::BILLING.lines().collect();
    assert!(original_lines[16].starts_with("\treturn payments.Charge("));
    assert_eq!(&original_lines[13][20..21], "(");
}

#[test]
fn unknown_directive_kind_produces_no_output() {
    let dir = common::workspace("cache_lookup");
    let out = dir.path().join("out");

    let err = plan::load_from_path(dir.path().join("plan.json")).unwrap_err();
    match err {
        PlanError::UnknownDirective { kind, .. } => assert_eq!(kind, "cache_lookup"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!out.exists());
}

#[test]
fn custom_config_changes_names() {
    let dir = common::workspace("remote_call");
    let workspace = plan::load_from_path(dir.path().join("plan.json")).unwrap();
    let config = go_rewrite::config::load_from_str(
        r#"
[runtime]
alias = "rt"

[wrappers]
prefix = "__rpc_"
file_name = "rpc_wrappers.go"
"#,
    )
    .unwrap();

    let rewrite = rewrite_package(&workspace.packages[0], &workspace.ids, &config).unwrap();
    let contents = &rewrite.files[0].contents;
    assert!(contents.contains("import rt \"encore.dev/runtime\"\n"));
    assert!(contents.contains("StripeKey: rt.LoadSecret(\"StripeKey\"),"));
    assert!(contents.contains("return __rpc_payments_Charge(41, 7,"));

    let generated = rewrite.wrappers.unwrap();
    assert_eq!(generated.file_name, "rpc_wrappers.go");
    assert!(generated.contents.contains("\tdefer rt.BeginCall("));
}
