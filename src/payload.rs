use crate::input::Input;
use crate::options::Options;
use serde::Serialize;

// Wire envelope for POST /event/publisher

/// The JSON body sent to the backend for one publish.
///
/// Built by the producer from an [`Input`] and the resolved [`Options`];
/// it borrows from both and lives only for the duration of the call.
#[derive(Debug, Serialize)]
pub struct Payload<'a, T> {
    #[serde(rename = "event_name")]
    pub event: &'a str,
    pub data: &'a T,
    #[serde(rename = "opts")]
    pub options: &'a Options,
    pub metadata: Metadata<'a>,
}

#[derive(Debug, Serialize)]
pub struct Metadata<'a> {
    pub headers: Headers<'a>,
}

/// Correlation headers, always present even when empty.
#[derive(Debug, Serialize)]
pub struct Headers<'a> {
    pub correlation_id: &'a str,
    pub event_id: &'a str,
}

impl<'a, T> Payload<'a, T> {
    pub fn new(input: &'a Input<T>, options: &'a Options) -> Self {
        Self {
            event: &input.event,
            data: &input.data,
            options,
            metadata: Metadata {
                headers: Headers {
                    correlation_id: &input.correlation_id,
                    event_id: &input.event_id,
                },
            },
        }
    }
}
