//! Requestors: the endpoints feedback is delivered to.

use graphwire_proto::ClassInfo;
use std::sync::mpsc;
use std::sync::Arc;
use tracing::warn;

/// An external endpoint that issues requests and receives feedback.
///
/// Identity is the `Arc` allocation: two handles to the same requestor are
/// the same subscriber.
pub trait Requestor: Send + Sync {
    /// Push one feedback tree to the endpoint. Called without any cache lock
    /// held, possibly from the thread that raised the event.
    fn deliver_feedback(&self, feedback: ClassInfo);

    /// Label used in logs.
    fn label(&self) -> &str {
        "requestor"
    }
}

pub(crate) fn requestor_id(requestor: &Arc<dyn Requestor>) -> usize {
    Arc::as_ptr(requestor).cast::<()>() as usize
}

/// A requestor that forwards feedback into a channel.
#[derive(Debug)]
pub struct ChannelRequestor {
    label: String,
    sender: mpsc::Sender<ClassInfo>,
}

impl ChannelRequestor {
    /// A requestor and the receiving end of its feedback.
    #[must_use]
    pub fn new(label: &str) -> (Arc<Self>, mpsc::Receiver<ClassInfo>) {
        let (sender, receiver) = mpsc::channel();
        let requestor = Arc::new(Self {
            label: label.to_string(),
            sender,
        });
        (requestor, receiver)
    }
}

impl Requestor for ChannelRequestor {
    fn deliver_feedback(&self, feedback: ClassInfo) {
        if self.sender.send(feedback).is_err() {
            warn!(requestor = %self.label, "Feedback receiver dropped");
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_requestor_delivers() {
        let (requestor, feedback) = ChannelRequestor::new("panel");
        requestor.deliver_feedback(ClassInfo::new("Robot", ""));
        assert_eq!(feedback.try_recv().unwrap().header.name, "Robot");
        assert_eq!(requestor.label(), "panel");
    }

    #[test]
    fn test_identity_is_the_allocation() {
        let (a, _rx) = ChannelRequestor::new("a");
        let (b, _rx2) = ChannelRequestor::new("b");
        let a: Arc<dyn Requestor> = a;
        let b: Arc<dyn Requestor> = b;
        assert_eq!(requestor_id(&a), requestor_id(&Arc::clone(&a)));
        assert_ne!(requestor_id(&a), requestor_id(&b));
    }
}
