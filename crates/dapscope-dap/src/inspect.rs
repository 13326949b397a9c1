//! Variable inspection of a stopped frame.

use std::future::Future;
use std::pin::Pin;

use crate::client::DapClient;
use crate::error::DapError;
use crate::protocol::{Scope, Variable};

/// A variable and, when expanded, its children.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableNode {
    pub variable: Variable,
    pub children: Vec<VariableNode>,
}

impl VariableNode {
    /// Depth-first walk yielding each node with its nesting level.
    pub fn walk(&self) -> Vec<(usize, &VariableNode)> {
        let mut out = Vec::new();
        self.walk_into(0, &mut out);
        out
    }

    fn walk_into<'a>(&'a self, level: usize, out: &mut Vec<(usize, &'a VariableNode)>) {
        out.push((level, self));
        for child in &self.children {
            child.walk_into(level + 1, out);
        }
    }
}

/// The variables of one scope.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopeSnapshot {
    pub scope: Scope,
    pub variables: Vec<VariableNode>,
}

impl ScopeSnapshot {
    /// Find a variable by name at any depth.
    pub fn find(&self, name: &str) -> Option<&Variable> {
        self.variables
            .iter()
            .flat_map(VariableNode::walk)
            .map(|(_, node)| &node.variable)
            .find(|v| v.name == name)
    }
}

type BoxedFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetch the scopes of `frame_id` and their variables.
///
/// `depth` counts variable levels: 1 lists each scope's own entries, 2 also
/// expands their children, and so on. Zero is treated as 1.
pub async fn collect_scopes(
    client: &DapClient,
    frame_id: i64,
    depth: u32,
) -> Result<Vec<ScopeSnapshot>, DapError> {
    let depth = depth.max(1);
    let mut snapshots = Vec::new();
    for scope in client.scopes(frame_id).await? {
        let variables = if scope.variables_reference > 0 {
            collect_variables(client, scope.variables_reference, depth).await?
        } else {
            Vec::new()
        };
        tracing::debug!(scope = %scope.name, count = variables.len(), "scope collected");
        snapshots.push(ScopeSnapshot { scope, variables });
    }
    Ok(snapshots)
}

/// Fetch the children of `reference`, expanding `levels - 1` further levels.
pub fn collect_variables(
    client: &DapClient,
    reference: i64,
    levels: u32,
) -> BoxedFuture<'_, Result<Vec<VariableNode>, DapError>> {
    Box::pin(async move {
        let mut nodes = Vec::new();
        for variable in client.variables(reference).await? {
            let children = if levels > 1 && variable.is_expandable() {
                collect_variables(client, variable.variables_reference, levels - 1).await?
            } else {
                Vec::new()
            };
            nodes.push(VariableNode { variable, children });
        }
        Ok(nodes)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientOptions;
    use crate::testing::connected_pair;
    use serde_json::json;

    fn leaf(name: &str, value: &str) -> VariableNode {
        VariableNode {
            variable: Variable {
                name: name.into(),
                value: value.into(),
                variable_type: None,
                variables_reference: 0,
            },
            children: Vec::new(),
        }
    }

    #[test]
    fn inspect_walk_reports_levels() {
        let mut root = leaf("config", "{...}");
        root.variable.variables_reference = 9;
        let mut inner = leaf("db", "{...}");
        inner.children.push(leaf("password", "'hunter2'"));
        root.children.push(inner);
        root.children.push(leaf("debug", "True"));

        let names: Vec<(usize, &str)> = root
            .walk()
            .into_iter()
            .map(|(level, node)| (level, node.variable.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![(0, "config"), (1, "db"), (2, "password"), (1, "debug")]
        );
    }

    #[test]
    fn inspect_find_nested_variable() {
        let mut root = leaf("user", "<User>");
        root.children.push(leaf("api_key", "'abc'"));
        let snapshot = ScopeSnapshot {
            scope: Scope {
                name: "Locals".into(),
                variables_reference: 1,
                expensive: None,
            },
            variables: vec![root, leaf("x", "1")],
        };
        assert_eq!(snapshot.find("api_key").unwrap().value, "'abc'");
        assert_eq!(snapshot.find("x").unwrap().value, "1");
        assert!(snapshot.find("missing").is_none());
    }

    #[tokio::test]
    async fn inspect_depth_one_lists_scope_entries_only() {
        let (client, mut stub) = connected_pair(ClientOptions::default());
        let (result, _) = tokio::join!(collect_scopes(&client, 100, 1), async {
            let req = stub.expect_command("scopes").await;
            stub.respond(
                &req,
                json!({"scopes": [{"name": "Locals", "variablesReference": 55}]}),
            )
            .await;
            let req = stub.expect_command("variables").await;
            assert_eq!(req.arguments, json!({"variablesReference": 55}));
            stub.respond(
                &req,
                json!({"variables": [
                    {"name": "x", "value": "42"},
                    {"name": "items", "value": "[1, 2]", "variablesReference": 60}
                ]}),
            )
            .await;
        });

        let scopes = result.unwrap();
        assert_eq!(scopes.len(), 1);
        assert_eq!(scopes[0].scope.name, "Locals");
        assert_eq!(scopes[0].variables.len(), 2);
        assert!(scopes[0].variables[1].children.is_empty());
    }

    #[tokio::test]
    async fn inspect_depth_two_expands_containers() {
        let (client, mut stub) = connected_pair(ClientOptions::default());
        let (result, _) = tokio::join!(collect_scopes(&client, 1, 2), async {
            let req = stub.expect_command("scopes").await;
            stub.respond(
                &req,
                json!({"scopes": [
                    {"name": "Locals", "variablesReference": 10},
                    {"name": "Empty", "variablesReference": 0}
                ]}),
            )
            .await;
            let req = stub.expect_command("variables").await;
            stub.respond(
                &req,
                json!({"variables": [
                    {"name": "cfg", "value": "{...}", "variablesReference": 11}
                ]}),
            )
            .await;
            let req = stub.expect_command("variables").await;
            assert_eq!(req.arguments["variablesReference"], 11);
            stub.respond(
                &req,
                json!({"variables": [
                    {"name": "token", "value": "'s3cr3t'", "variablesReference": 12}
                ]}),
            )
            .await;
        });

        let scopes = result.unwrap();
        assert_eq!(scopes.len(), 2);
        let cfg = &scopes[0].variables[0];
        assert_eq!(cfg.children.len(), 1);
        // The third level is not fetched.
        assert!(cfg.children[0].children.is_empty());
        assert!(scopes[1].variables.is_empty());
    }
}
