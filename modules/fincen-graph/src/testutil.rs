//! Test doubles for the graph gateway, plus a real Neo4j via testcontainers.

use std::sync::Mutex;

use async_trait::async_trait;

use fincen_common::{GraphError, Record};

use crate::gateway::{GraphGateway, Params};

enum Canned {
    Rows(Vec<Record>),
    Fail(String),
}

/// In-memory gateway returning canned rows for exact query strings.
///
/// Unknown queries return no rows. Every call is recorded.
#[derive(Default)]
pub struct StubGateway {
    responses: Vec<(String, Canned)>,
    calls: Mutex<Vec<(String, Params)>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, cypher: &str, rows: Vec<Record>) -> Self {
        self.responses.push((cypher.to_string(), Canned::Rows(rows)));
        self
    }

    pub fn with_error(mut self, cypher: &str, message: &str) -> Self {
        self.responses
            .push((cypher.to_string(), Canned::Fail(message.to_string())));
        self
    }

    /// Queries run so far, in order, with their parameters.
    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

#[async_trait]
impl GraphGateway for StubGateway {
    async fn run(&self, cypher: &str, params: Params) -> Result<Vec<Record>, GraphError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((cypher.to_string(), params));
        }
        match self.responses.iter().find(|(q, _)| q == cypher) {
            Some((_, Canned::Rows(rows))) => Ok(rows.clone()),
            Some((_, Canned::Fail(message))) => Err(GraphError::Neo4j(message.clone())),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(feature = "test-utils")]
pub use container::neo4j_container;

#[cfg(feature = "test-utils")]
mod container {
    use testcontainers::{
        core::{ContainerPort, WaitFor},
        runners::AsyncRunner,
        ContainerAsync, GenericImage, ImageExt,
    };

    use fincen_common::Credentials;

    use crate::GraphClient;

    /// Spin up a Neo4j container and return the container handle + connected GraphClient.
    ///
    /// The container is stopped when `ContainerAsync` is dropped, so callers
    /// must hold it for the duration of the test.
    pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
        let image = GenericImage::new("neo4j", "5.25.1")
            .with_exposed_port(ContainerPort::Tcp(7687))
            .with_wait_for(WaitFor::message_on_stdout("Started."))
            .with_env_var("NEO4J_AUTH", "neo4j/testpassword");

        let container: ContainerAsync<GenericImage> = image
            .start()
            .await
            .expect("Failed to start Neo4j container");

        let host_port = container
            .get_host_port_ipv4(7687)
            .await
            .expect("Failed to get Neo4j host port");

        let uri = format!("bolt://127.0.0.1:{host_port}");
        let credentials = Credentials {
            user: "neo4j".to_string(),
            pd: "testpassword".to_string(),
        };
        let client = GraphClient::connect(&uri, &credentials, 1)
            .await
            .expect("Failed to connect to Neo4j");

        (container, client)
    }
}
