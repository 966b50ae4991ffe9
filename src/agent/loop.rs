//! Agent loop implementation
//!
//! The control loop of the core: pulls inbound messages off the bus,
//! resolves the owning session, drives the bounded think/act iteration
//! against the model backend and tool invoker, persists the updated history,
//! and pushes exactly one reply per inbound message back onto the bus.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{watch, RwLock};
use tracing::{error, info, info_span, Instrument};

use crate::bus::{EventBus, InboundMessage, OutboundMessage};
use crate::config::Config;
use crate::error::{Result, SwitchboardError};
use crate::providers::ModelProvider;
use crate::session::{Session, SessionStore, ToolRecord, Turn};
use crate::tools::{ToolContext, ToolInvoker, ToolRegistry};

use super::context::ContextBuilder;

/// Deterministic final answer synthesized when a pass exhausts its
/// iteration budget.
const ITERATION_LIMIT_NOTICE: &str =
    "I reached the iteration limit for this request and stopped. The work completed so far has been saved.";

/// The main agent loop.
///
/// One inbound message becomes one *pass*: acquire the owning session,
/// run model rounds and tool rounds under the iteration budget, persist,
/// reply. The per-session exclusive section spans the entire pass, not just
/// the persistence step: two inbound messages for the same conversation can
/// never interleave tool calls against divergent views of history. A slow
/// pass for session A never blocks session B; a second message for A queues
/// behind the first, giving FIFO per conversation.
///
/// # Example
///
/// ```rust,ignore
/// let store = Arc::new(SessionStore::new()?);
/// let bus = Arc::new(EventBus::with_capacity(config.bus.capacity));
/// let mut registry = ToolRegistry::new();
/// registry.register(Box::new(EchoTool))?;
///
/// let agent = Arc::new(AgentLoop::new(config, store, bus, registry));
/// agent.set_provider(Box::new(my_provider)).await;
/// tokio::spawn({
///     let agent = Arc::clone(&agent);
///     async move { agent.run().await }
/// });
/// ```
pub struct AgentLoop {
    /// Core configuration
    config: Config,
    /// Session store for conversation state
    store: Arc<SessionStore>,
    /// Event bus for input/output
    bus: Arc<EventBus>,
    /// The model backend (Arc<dyn ..> allows cheap cloning without holding the lock)
    provider: Arc<RwLock<Option<Arc<dyn ModelProvider>>>>,
    /// Tool invoker over the startup-resolved registry
    invoker: Arc<ToolInvoker>,
    /// Context builder for constructing model-facing messages
    context_builder: ContextBuilder,
    /// Whether the loop is currently running
    running: AtomicBool,
    /// Shutdown signal sender
    shutdown_tx: watch::Sender<bool>,
}

impl AgentLoop {
    /// Create a new agent loop over a startup-resolved tool registry.
    pub fn new(
        config: Config,
        store: Arc<SessionStore>,
        bus: Arc<EventBus>,
        registry: ToolRegistry,
    ) -> Self {
        let context_builder = match &config.agent.system_prompt {
            Some(prompt) => ContextBuilder::new().with_system_prompt(prompt),
            None => ContextBuilder::new(),
        };
        Self::with_context_builder(config, store, bus, registry, context_builder)
    }

    /// Create a new agent loop with a custom context builder.
    pub fn with_context_builder(
        config: Config,
        store: Arc<SessionStore>,
        bus: Arc<EventBus>,
        registry: ToolRegistry,
        context_builder: ContextBuilder,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            config,
            store,
            bus,
            provider: Arc::new(RwLock::new(None)),
            invoker: Arc::new(ToolInvoker::new(Arc::new(registry))),
            context_builder,
            running: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    /// Check if the loop is currently running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Set the model backend to use.
    pub async fn set_provider(&self, provider: Box<dyn ModelProvider>) {
        let mut p = self.provider.write().await;
        *p = Some(Arc::from(provider));
    }

    /// Process a single inbound message: one full pass.
    ///
    /// Returns the reply content. The entire pass runs inside the session's
    /// exclusive section; the session is flushed durably before this method
    /// returns.
    ///
    /// A backend failure mid-pass does not surface as `Err`: the turns
    /// completed so far are persisted and the returned reply is a
    /// user-visible error notice. `Err` is reserved for failures before the
    /// pass can start (no provider, malformed key) and for persistence or
    /// watchdog failures.
    pub async fn process_message(&self, msg: &InboundMessage) -> Result<String> {
        if !msg.has_valid_session_key() {
            return Err(SwitchboardError::Config(format!(
                "malformed session key {:?}: connector and conversation id must be non-empty",
                msg.session_key
            )));
        }

        // Clone the provider Arc early and release the RwLock immediately,
        // so multi-second model calls never hold it.
        let provider = {
            let guard = self.provider.read().await;
            Arc::clone(
                guard
                    .as_ref()
                    .ok_or_else(|| SwitchboardError::Provider("no provider configured".into()))?,
            )
        };

        let invoker = Arc::clone(&self.invoker);
        let tool_defs = invoker.registry().definitions();
        let mut tool_ctx =
            ToolContext::new().with_conversation(&msg.connector, &msg.conversation_id);
        if let Some(ref workspace) = self.config.agent.workspace {
            tool_ctx = tool_ctx.with_workspace(workspace);
        }
        let tool_timeout = Duration::from_secs(self.config.agent.tool_timeout_secs);
        let max_iterations = self.config.agent.max_iterations;
        let context_builder = self.context_builder.clone();
        let content = msg.content.clone();

        let pass = self
            .store
            .with_session(&msg.session_key, move |session: &mut Session| {
                async move {
                    session.apply(Turn::user(&content));

                    let mut rounds = 0usize;
                    let reply = loop {
                        if rounds >= max_iterations {
                            info!(rounds, "Iteration budget exhausted, forcing termination");
                            session.apply(Turn::assistant(ITERATION_LIMIT_NOTICE));
                            break ITERATION_LIMIT_NOTICE.to_string();
                        }
                        rounds += 1;

                        let messages = context_builder.build_messages(&session.turns);
                        match provider.chat(messages, tool_defs.clone()).await {
                            Ok(response) if !response.has_tool_calls() => {
                                session.apply(Turn::assistant(&response.content));
                                break response.content;
                            }
                            Ok(response) => {
                                let mut records = Vec::with_capacity(response.tool_calls.len());
                                for call in &response.tool_calls {
                                    let result = invoker.invoke(call, &tool_ctx, tool_timeout).await;
                                    records.push(ToolRecord::new(call.clone(), result));
                                }
                                session.apply(Turn::assistant_with_tools(
                                    &response.content,
                                    records,
                                ));
                            }
                            Err(e) => {
                                // Abort the pass but keep the turns completed
                                // so far; the reply is a user-visible notice.
                                error!(error = %e, rounds, "Model backend failed, aborting pass");
                                break format!(
                                    "I ran into an error while working on that: {}",
                                    e
                                );
                            }
                        }
                    };
                    Ok(reply)
                }
                .boxed()
            });

        if self.config.agent.watchdog_secs > 0 {
            let deadline = Duration::from_secs(self.config.agent.watchdog_secs);
            match tokio::time::timeout(deadline, pass).await {
                Ok(result) => result,
                Err(_) => Err(SwitchboardError::Session(format!(
                    "message watchdog expired after {}s",
                    self.config.agent.watchdog_secs
                ))),
            }
        } else {
            pass.await
        }
    }

    /// Run the loop: consume inbound messages until `stop()` is called or
    /// the inbound channel closes.
    ///
    /// Every inbound message yields exactly one outbound message — the reply
    /// on success, an error notice otherwise. One conversation's failure
    /// never stops the loop from servicing others.
    ///
    /// # Errors
    /// Returns an error if the loop is already running.
    pub async fn run(&self) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(SwitchboardError::Config("agent loop already running".into()));
        }
        info!("Agent loop started");

        // Subscribe fresh and consume any stale stop signal from a previous run.
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let _ = *shutdown_rx.borrow_and_update();

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Agent loop received shutdown signal");
                        break;
                    }
                }
                msg = self.bus.consume_inbound() => {
                    let Some(msg) = msg else {
                        info!("Inbound channel closed");
                        break;
                    };
                    let request_id = uuid::Uuid::new_v4();
                    let span = info_span!(
                        "request",
                        request_id = %request_id,
                        session = %msg.session_key,
                        connector = %msg.connector,
                        sender = %msg.sender_id,
                    );
                    self.handle_message(&msg).instrument(span).await;
                }
            }

            if !self.running.load(Ordering::SeqCst) {
                break;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("Agent loop stopped");
        Ok(())
    }

    /// Process one message and publish its single reply.
    async fn handle_message(&self, msg: &InboundMessage) {
        info!("Processing message");
        let start = std::time::Instant::now();

        let outbound = match self.process_message(msg).await {
            Ok(reply) => {
                info!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    reply_len = reply.len(),
                    "Request completed"
                );
                OutboundMessage::reply_to(msg, &reply)
            }
            Err(e) => {
                error!(
                    latency_ms = start.elapsed().as_millis() as u64,
                    error = %e,
                    "Request failed"
                );
                OutboundMessage::reply_to(msg, &format!("Error: {}", e))
            }
        };

        if let Err(e) = self.bus.publish_outbound(outbound).await {
            error!(error = %e, "Failed to publish outbound message");
        }
    }

    /// Stop the loop after any in-progress pass completes.
    pub fn stop(&self) {
        info!("Stopping agent loop");
        self.running.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);
    }

    /// Get a reference to the session store.
    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    /// Get a reference to the event bus.
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Get a reference to the tool invoker.
    pub fn invoker(&self) -> &Arc<ToolInvoker> {
        &self.invoker
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &Config {
        &self.config
    }
}
