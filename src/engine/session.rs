// View-model facade owning one user's form, wizard and recompute pipeline.
// Every edit goes through the pipeline so derived state is recomputed after the
// debounce delay; wizard transitions flush first so the gate sees fresh validity.

use std::sync::Arc;

use ethers::types::Address;
use tokio::sync::Mutex;

use crate::chain::lookups::MarketLookups;
use crate::config::EngineConfig;
use crate::engine::form::{fetch_token_list, ConnectionState, PositionForm, SessionHandle};
use crate::engine::pipeline::RecomputePipeline;
use crate::engine::wizard::{Step, StepStatus, Transition, Wizard};
use crate::models::{FeeTier, PriceRange, Side, TokenDescriptor};

pub struct PositionSession<L: MarketLookups + ?Sized + 'static> {
    lookups: Arc<L>,
    wizard: Wizard,
    pipeline: RecomputePipeline<L>,
}

impl<L: MarketLookups + ?Sized + 'static> PositionSession<L> {
    pub fn new(lookups: Arc<L>, config: EngineConfig) -> Self {
        let form = Arc::new(Mutex::new(PositionForm::new()));
        let pipeline = RecomputePipeline::new(form, lookups.clone(), config);
        Self { lookups, wizard: Wizard::new(), pipeline }
    }

    pub fn wizard(&self) -> &Wizard {
        &self.wizard
    }

    /// Copy of the current form state.
    pub async fn form(&self) -> PositionForm {
        self.pipeline.form().lock().await.clone()
    }

    pub async fn connecting(&mut self) {
        self.pipeline.update(|form| form.set_connection(ConnectionState::Connecting)).await;
    }

    pub async fn connect(&mut self, account: Address) {
        log::info!("Session connected for {:?}", account);
        self.pipeline
            .update(|form| form.set_connection(ConnectionState::Connected(SessionHandle { account })))
            .await;
    }

    pub async fn disconnect(&mut self) {
        self.pipeline.update(|form| form.set_connection(ConnectionState::Disconnected)).await;
    }

    /// Metadata is fetched without holding the form, so a pass firing meanwhile is not blocked.
    pub async fn load_token_list(&mut self, addresses: &[Address]) -> usize {
        let tokens = fetch_token_list(addresses, self.lookups.as_ref()).await;
        let count = tokens.len();
        self.pipeline.form().lock().await.set_token_list(tokens);
        count
    }

    pub async fn select_token(&mut self, side: Side, token: Option<TokenDescriptor>) {
        self.pipeline.update(|form| form.select_token(side, token)).await;
    }

    pub async fn set_fee(&mut self, fee: Option<FeeTier>) {
        self.pipeline.update(|form| form.set_fee(fee)).await;
    }

    pub async fn edit_initial_price(&mut self, text: &str) -> bool {
        self.gated_edit(|form| form.edit_initial_price(text)).await
    }

    pub async fn edit_min_price(&mut self, text: &str) -> bool {
        let accepted = self.pipeline.form().lock().await.edit_min_price(text);
        accepted
    }

    pub async fn edit_max_price(&mut self, text: &str) -> bool {
        let accepted = self.pipeline.form().lock().await.edit_max_price(text);
        accepted
    }

    /// Commits the typed min/max buffers. Typing alone does not trigger a recompute.
    pub async fn commit_range(&mut self) -> bool {
        self.gated_edit(|form| form.commit_range()).await
    }

    pub async fn set_range(&mut self, range: PriceRange) {
        self.pipeline.update(|form| form.set_range(range)).await;
    }

    pub async fn edit_amount(&mut self, side: Side, text: &str) -> bool {
        self.gated_edit(|form| form.edit_amount(side, text)).await
    }

    /// Only accepted edits reschedule the pipeline.
    async fn gated_edit<F>(&mut self, edit: F) -> bool
    where
        F: FnOnce(&mut PositionForm) -> bool,
    {
        let accepted = {
            let mut form = self.pipeline.form().lock().await;
            edit(&mut form)
        };
        if accepted {
            self.pipeline.schedule();
        }
        accepted
    }

    /// Recomputes immediately instead of waiting for the debounce timer.
    pub async fn refresh(&mut self) {
        self.pipeline.flush().await;
    }

    pub async fn go_next(&mut self) -> Transition {
        self.pipeline.flush().await;
        let transition = {
            let mut form = self.pipeline.form().lock().await;
            self.wizard.go_next(&mut form)
        };
        self.after_transition(transition);
        transition
    }

    pub async fn go_back(&mut self) -> Transition {
        let transition = {
            let mut form = self.pipeline.form().lock().await;
            self.wizard.go_back(&mut form)
        };
        self.after_transition(transition);
        transition
    }

    pub async fn select_step(&mut self, step: Step) -> Transition {
        self.pipeline.flush().await;
        let transition = {
            let mut form = self.pipeline.form().lock().await;
            self.wizard.select_step(step, &mut form)
        };
        self.after_transition(transition);
        transition
    }

    pub async fn cancel(&mut self) {
        {
            let mut form = self.pipeline.form().lock().await;
            self.wizard.cancel(&mut form);
        }
        self.pipeline.schedule();
    }

    pub async fn step_status(&self, step: Step) -> StepStatus {
        let form = self.pipeline.form().lock().await;
        self.wizard.status(step, &form)
    }

    fn after_transition(&mut self, transition: Transition) {
        if transition.moved() {
            self.pipeline.schedule();
        }
    }

    /// Tears the session down; pending recomputes never land.
    pub fn close(&mut self) {
        self.pipeline.shutdown();
    }
}
