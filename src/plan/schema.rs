use crate::model::Signature;
use serde::Deserialize;
use std::path::PathBuf;

/// Classifier output handed to the rewriter.
///
/// Spans are `[start, end)` byte offsets local to the named file. Paths are
/// relative to the plan's root directory unless absolute.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RewritePlan {
    pub packages: Vec<PackagePlan>,
    #[serde(default)]
    pub rpcs: Vec<RpcPlan>,
    #[serde(default)]
    pub node_ids: Vec<NodeIdPlan>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PackagePlan {
    pub name: String,
    pub import_path: String,
    pub dir: PathBuf,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub secrets: Vec<String>,
    #[serde(default)]
    pub files: Vec<FilePlan>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilePlan {
    pub path: PathBuf,
    #[serde(default)]
    pub directives: Vec<DirectivePlan>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DirectivePlan {
    /// `database_handle`, `log_annotation`, `remote_call`,
    /// `remote_call_definition` or `secret_declaration`
    pub kind: String,
    pub span: [usize; 2],
    /// `Service.Procedure`, for remote calls
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RpcPlan {
    pub service: String,
    pub name: String,
    /// Import path of the defining package
    pub package: String,
    pub file: PathBuf,
    /// Span of the function declaration
    pub span: [usize; 2],
    #[serde(default)]
    pub signature: Signature,
}

impl RpcPlan {
    pub fn key(&self) -> String {
        format!("{}.{}", self.service, self.name)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NodeIdPlan {
    pub file: PathBuf,
    pub span: [usize; 2],
    pub id: u64,
}
