use crate::core::Value;
use tokio::sync::mpsc;

/// Slots between a producer and its consumer. Kept at one so a slow consumer
/// pushes back on its producer almost immediately.
pub const TRANSPORT_CAPACITY: usize = 1;

/// Producer end. Exactly one task owns it; dropping it closes the transport.
pub type Outlet = mpsc::Sender<Value>;

/// Consumer end. `recv()` yields values in send order, then `None` once the
/// producer is gone and every earlier value has been drained.
pub type Inlet = mpsc::Receiver<Value>;

pub fn transport() -> (Outlet, Inlet) {
    mpsc::channel(TRANSPORT_CAPACITY)
}
