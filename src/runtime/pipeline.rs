use async_trait::async_trait;
use tokio::sync::{broadcast, mpsc};
use tracing::{info, warn};

use crate::error::Result;

/// A message to cancel the pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CancelRequest;

/// A long running component, executed in its own tokio task.
#[async_trait]
pub trait Node: Send {
    /// Name of the node, used in log messages.
    fn name(&self) -> &str;

    /// Runs the node until `kill` fires or the node decides to stop on its own.
    async fn run(&mut self, kill: broadcast::Receiver<()>);
}

/// A set of nodes executed concurrently until cancellation.
pub struct Pipeline {
    nodes: Vec<Box<dyn Node>>,
    cancel_request_sender: mpsc::UnboundedSender<CancelRequest>,
    cancel_request_receiver: mpsc::UnboundedReceiver<CancelRequest>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        let (cancel_request_sender, cancel_request_receiver) = mpsc::unbounded_channel();
        Self {
            nodes: vec![],
            cancel_request_sender,
            cancel_request_receiver,
        }
    }

    /// Adds a node.
    pub fn add(&mut self, node: impl Node + 'static) -> &mut Self {
        self.nodes.push(Box::new(node));
        self
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if no node has been added.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Names of the nodes, in insertion order.
    pub fn node_names(&self) -> Vec<String> {
        self.nodes.iter().map(|node| node.name().to_owned()).collect()
    }

    /// Returns a sender to send cancel requests to the pipeline.
    pub fn cancel_request_sender(&self) -> mpsc::UnboundedSender<CancelRequest> {
        self.cancel_request_sender.clone()
    }

    /// Cancels the pipeline on Ctrl-C.
    ///
    /// Fails if a handler has been installed before in this process.
    pub fn install_ctrlc_handler(&self) -> Result<()> {
        let cancel_requester = self.cancel_request_sender();
        ctrlc::set_handler(move || {
            if cancel_requester.send(CancelRequest).is_err() {
                warn!("Ctrl-C received, but the pipeline is gone");
            }
        })?;
        Ok(())
    }

    /// Executes the pipeline.
    ///
    /// Each node runs in a dedicated tokio task. Execution ends on the first cancel request,
    /// which is also issued whenever a node returns on its own. Then the kill signal is
    /// broadcast, all tasks are joined and the pipeline is returned with its nodes, so it can
    /// be inspected or run again.
    pub async fn run(mut self) -> Self {
        info!("Pipeline started ...");

        let (kill_sender, _) = broadcast::channel(1);
        let mut handles = vec![];
        for mut node in std::mem::take(&mut self.nodes) {
            let kill_receiver = kill_sender.subscribe();
            let node_done = self.cancel_request_sender();
            handles.push(tokio::spawn(async move {
                node.run(kill_receiver).await;
                info!("{} finished", node.name());
                // receiver is owned by the pipeline and outlives all tasks
                let _ = node_done.send(CancelRequest);
                node
            }));
        }

        match self.cancel_request_receiver.recv().await {
            Some(CancelRequest) => info!("Pipeline cancellation requested"),
            None => warn!("Cancel request channel closed"),
        }
        // no receiver left if all nodes returned already
        let _ = kill_sender.send(());

        for handle in handles {
            match handle.await {
                Ok(node) => self.nodes.push(node),
                Err(err) => warn!("node task failed: {}", err),
            }
        }
        while self.cancel_request_receiver.try_recv().is_ok() {}

        info!("Pipeline execution finished");
        self
    }
}
