//! The engine reports recomputation, invalidation and failures as `tracing`
//! events with dotted message names.

use std::sync::{Arc, Mutex};

use autoprop_runtime::{ComputedDefinition, TypeBuilder, auto, root};
use tracing::Subscriber;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

#[derive(Debug, Clone, PartialEq)]
struct Captured {
    message: String,
    object: Option<u64>,
    property: Option<String>,
    version: Option<u64>,
}

struct EventCapture {
    events: Arc<Mutex<Vec<Captured>>>,
}

impl<S> Layer<S> for EventCapture
where
    S: Subscriber + for<'lookup> tracing_subscriber::registry::LookupSpan<'lookup>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        #[derive(Default)]
        struct Fields {
            message: Option<String>,
            object: Option<u64>,
            property: Option<String>,
            version: Option<u64>,
        }
        impl tracing::field::Visit for Fields {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                match field.name() {
                    "message" => self.message = Some(value.to_string()),
                    "property" => self.property = Some(value.to_string()),
                    _ => {}
                }
            }

            fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
                match field.name() {
                    "object" => self.object = Some(value),
                    "version" => self.version = Some(value),
                    _ => {}
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut fields = Fields::default();
        event.record(&mut fields);
        if let Some(message) = fields.message {
            self.events.lock().expect("capture lock").push(Captured {
                message,
                object: fields.object,
                property: fields.property,
                version: fields.version,
            });
        }
    }
}

fn messages(events: &Arc<Mutex<Vec<Captured>>>) -> Vec<String> {
    events
        .lock()
        .expect("capture lock")
        .iter()
        .map(|e| e.message.clone())
        .collect()
}

#[test]
fn engine_emits_structured_events() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = tracing_subscriber::registry().with(EventCapture {
        events: Arc::clone(&events),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    let person = TypeBuilder::new("Person")
        .computed("full", auto!(|first, last| format!("{first} {last}")))
        .computed(
            "broken",
            ComputedDefinition::inferred(&["first"], |_| Err("nope".into())),
        )
        .computed("app", auto!("App.name" => |name| name))
        .build();
    let obj = person
        .create_with([("first", "Arthur"), ("last", "Gunn")])
        .unwrap();

    // First read computes, second is served from the cache.
    obj.get("full").unwrap();
    obj.get("full").unwrap();
    {
        let captured = events.lock().expect("capture lock");
        let recomputes: Vec<&Captured> = captured
            .iter()
            .filter(|e| e.message == "computed.recompute")
            .collect();
        assert_eq!(recomputes.len(), 1);
        assert_eq!(recomputes[0].property.as_deref(), Some("full"));
        assert_eq!(recomputes[0].version, Some(1));
        assert_eq!(recomputes[0].object, Some(obj.id()));
    }

    obj.set("first", "Attila the").unwrap();
    {
        let captured = events.lock().expect("capture lock");
        let invalidate = captured
            .iter()
            .find(|e| e.message == "computed.invalidate")
            .expect("expected computed.invalidate");
        assert_eq!(invalidate.object, Some(obj.id()));
        assert_eq!(invalidate.property.as_deref(), Some("full"));
    }

    assert!(obj.get("broken").is_err());
    assert!(
        messages(&events).contains(&"computed.error".to_string()),
        "expected computed.error"
    );

    root::clear();
    assert!(obj.get("app").unwrap().is_absent());
    assert!(
        messages(&events).contains(&"root.missing".to_string()),
        "expected root.missing warning"
    );
}
