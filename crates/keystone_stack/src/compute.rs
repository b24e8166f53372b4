//! Managed function construct.

use crate::error::StackResult;
use crate::network::{NetworkBinding, NetworkDeclaration, NetworkProvider};
use keystone_core::{Attribute, LogicalId, Value};
use keystone_graph::{Node, ResourceGraph, ResourceKind};
use std::collections::BTreeMap;

/// Execution timeout of every function, in seconds
pub const TIMEOUT_SECONDS: u32 = 15 * 60;

/// Memory of every function, in megabytes
pub const MEMORY_MB: u32 = 1024;

/// Entry point of every function
pub const HANDLER: &str = "handler.lambda_handler";

/// Environment key the secret reference is stored under
pub const SECRET_ENV_KEY: &str = "secret";

/// Inputs of a [`ComputeNode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeProps {
    /// Code asset path, relative to the assets directory
    pub src: String,
    /// Runtime identifier
    pub runtime: String,
    /// Layer ARNs
    pub layers: Vec<String>,
    /// Physical function name
    pub name: Option<String>,
    /// Environment variables
    pub env_vars: Option<BTreeMap<String, String>>,
    /// Secret reference merged into the environment
    pub secret: Option<String>,
    /// Execution role
    pub role: Option<Value>,
}

impl ComputeProps {
    /// Props for code at `src` running on `runtime`
    #[must_use]
    pub fn new(src: impl Into<String>, runtime: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            runtime: runtime.into(),
            layers: Vec::new(),
            name: None,
            env_vars: None,
            secret: None,
            role: None,
        }
    }

    /// Set the physical name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the environment
    #[must_use]
    pub fn with_env(mut self, env: BTreeMap<String, String>) -> Self {
        self.env_vars = Some(env);
        self
    }

    /// Set the secret reference
    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the execution role
    #[must_use]
    pub fn with_role(mut self, role: Value) -> Self {
        self.role = Some(role);
        self
    }

    /// Set the layers
    #[must_use]
    pub fn with_layers(mut self, layers: Vec<String>) -> Self {
        self.layers = layers;
        self
    }
}

/// A function together with its network binding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeNode {
    /// Construct id
    pub id: LogicalId,
    /// Function node id
    pub function_id: LogicalId,
    /// Network binding the function runs inside
    pub networking: NetworkBinding,
    /// Physical function name
    pub name: Option<String>,
}

impl ComputeNode {
    /// Declare a function under `parent/cid`
    ///
    /// Declares exactly one network binding (through `network`) and one
    /// function node, committed together. Timeout, memory, and
    /// public-subnet placement are fixed.
    ///
    /// # Errors
    ///
    /// Returns error if an id is invalid or already taken, or a reference
    /// names an undeclared node; the graph is unchanged on error
    pub fn new(
        graph: &mut ResourceGraph,
        network: &dyn NetworkProvider,
        parent: &LogicalId,
        cid: &str,
        props: ComputeProps,
    ) -> StackResult<Self> {
        let id = parent.child(cid)?;
        let NetworkDeclaration {
            nodes: mut batch,
            binding: networking,
        } = network.bind(&id, props.name.as_deref())?;

        let mut environment = props.env_vars.unwrap_or_default();
        if let Some(secret) = props.secret {
            environment.insert(SECRET_ENV_KEY.to_string(), secret);
        }

        let function_id = id.child("lambda")?;
        batch.push(Node::new(
            function_id.clone(),
            ResourceKind::Function {
                function_name: props.name.clone(),
                code: props.src,
                handler: HANDLER.to_string(),
                runtime: props.runtime,
                layers: props.layers,
                environment,
                vpc_id: networking.isolation.vpc_id.clone(),
                subnet_ids: networking.isolation.subnet_ids.clone(),
                security_group_ids: vec![networking.isolation.security_group.clone()],
                allow_public_subnet: false,
                timeout_seconds: TIMEOUT_SECONDS,
                memory_mb: MEMORY_MB,
                role: props.role,
            },
        ));
        graph.commit(batch)?;

        tracing::debug!(function = %function_id, "declared compute node");

        Ok(Self {
            id,
            function_id,
            networking,
            name: props.name,
        })
    }

    /// Invocation address of the function
    #[must_use]
    pub fn function_arn(&self) -> Value {
        Value::reference(&self.function_id, Attribute::Arn)
    }
}
