use crate::demo;
use graphwire_core::{Config, Dispatcher, Error, FeedbackCache, Requestor, Session};
use graphwire_proto::{codec, ClassInfo};
use miette::Result;
use std::io::{self, Read};
use std::sync::Arc;
use tracing::{debug, warn};

/// Prints every feedback tree as one JSON line on stdout.
struct StdoutRequestor;

impl Requestor for StdoutRequestor {
    fn deliver_feedback(&self, feedback: ClassInfo) {
        match codec::encode(&feedback) {
            Ok(text) => println!("{text}"),
            Err(err) => warn!(%err, "Failed to encode feedback"),
        }
    }

    fn label(&self) -> &str {
        "stdout"
    }
}

/// Every request encoded in `input`, a file path or `-` for stdin.
fn read_requests(input: &str) -> graphwire_core::Result<Vec<ClassInfo>> {
    let text = if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        text
    } else {
        std::fs::read_to_string(input)?
    };
    Ok(codec::decode_all(&text)?)
}

/// Dispatch every request in `input` against one demo plant, in order.
///
/// Subscriptions made by earlier requests stay active for later ones, so
/// feedback lines show up between the responses that trigger them.
pub fn run(input: &str, pretty: bool, config: &Config) -> Result<()> {
    let requests = read_requests(input).map_err(|e| match e {
        Error::Codec(e) => miette::miette!("Invalid request: {}", e),
        e => miette::miette!("Failed to read {}: {}", input, e),
    })?;
    if requests.is_empty() {
        return Err(miette::miette!("No request in {}", input));
    }

    let registry = demo::registry().map_err(|e| miette::miette!("Invalid demo graph: {}", e))?;
    let feedback = FeedbackCache::new(Arc::clone(&registry));
    let dispatcher = Dispatcher::new(registry, feedback).with_config(config);
    let requestor: Arc<dyn Requestor> = Arc::new(StdoutRequestor);
    let session = Session::new(demo::root(), requestor);

    for mut request in requests {
        dispatcher.dispatch(&session, &mut request);
        let encoded = if pretty {
            codec::encode_pretty(&request)
        } else {
            codec::encode(&request)
        }
        .map_err(|e| miette::miette!("Failed to encode response: {}", e))?;
        println!("{encoded}");
    }

    debug!(
        subscriptions = dispatcher.feedback().len(),
        "Dispatch finished"
    );
    Ok(())
}
