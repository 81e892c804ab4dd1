use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};

/// Hand a deep link (`sms:`, `tel:`) to the host platform.
///
/// This is fire-and-intent: the shell opens the external application with the
/// pre-filled content and we never learn whether the user completed the send
/// or call, so no response comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentOperation {
    Open { uri: String },
}

impl Operation for IntentOperation {
    type Output = ();
}

pub struct Intent<Ev> {
    context: CapabilityContext<IntentOperation, Ev>,
}

impl<Ev> Capability<Ev> for Intent<Ev> {
    type Operation = IntentOperation;
    type MappedSelf<MappedEv> = Intent<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Intent::new(self.context.map_event(f))
    }
}

impl<Ev> Intent<Ev>
where
    Ev: Send + 'static,
{
    pub fn new(context: CapabilityContext<IntentOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn open(&self, uri: String) {
        let context = self.context.clone();
        self.context.spawn(async move {
            context.notify_shell(IntentOperation::Open { uri }).await;
        });
    }
}
