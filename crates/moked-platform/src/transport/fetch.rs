//! Relay transport over the browser `fetch()` API.
//!
//! POSTs the chat request to the relay endpoint and reads the chunked
//! text body through a `ReadableStreamDefaultReader`, decoding bytes
//! incrementally with `TextDecoder` so multi-byte UTF-8 sequences split
//! across chunk boundaries survive.
//!
//! `stream_chat` itself does no I/O: it creates the `AbortController`,
//! spawns the request task, and hands back the event stream. That keeps
//! the abort handle valid from the first instant, before the fetch has
//! even started.

use std::rc::Rc;

use futures::channel::mpsc;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AbortController, AbortSignal, Headers, ReadableStreamDefaultReader, Request, RequestInit,
    Response, TextDecodeOptions, TextDecoder,
};

use moked_core::ports::{AbortHandle, ChatStream, ChatTransport, StreamEvent};
use moked_types::protocol::ChatRequestBody;

pub struct FetchTransport {
    api_url: String,
}

impl FetchTransport {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
        }
    }
}

struct FetchAbort {
    controller: Option<AbortController>,
}

impl AbortHandle for FetchAbort {
    fn abort(&self) {
        if let Some(controller) = &self.controller {
            controller.abort();
        }
    }
}

impl ChatTransport for FetchTransport {
    fn stream_chat(&self, body: ChatRequestBody) -> ChatStream {
        // AbortController construction can only fail in exotic hosts;
        // without one the request simply cannot be cancelled early.
        let controller = AbortController::new().ok();
        let signal = controller.as_ref().map(AbortController::signal);

        let (tx, rx) = mpsc::unbounded();
        let url = self.api_url.clone();
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(reason) = run_request(&url, &body, signal, &tx).await {
                // Receiver may already be gone; nothing to do then.
                let _ = tx.unbounded_send(StreamEvent::Error(reason));
            }
        });

        ChatStream {
            abort: Rc::new(FetchAbort { controller }),
            events: Box::pin(rx),
        }
    }
}

async fn run_request(
    url: &str,
    body: &ChatRequestBody,
    signal: Option<AbortSignal>,
    tx: &mpsc::UnboundedSender<StreamEvent>,
) -> Result<(), String> {
    let payload = serde_json::to_string(body).map_err(|e| format!("encode request: {e}"))?;

    let headers = Headers::new().map_err(js_err)?;
    headers
        .set("Content-Type", "application/json")
        .map_err(js_err)?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(&payload));
    if let Some(signal) = &signal {
        init.set_signal(Some(signal));
    }

    let request = Request::new_with_str_and_init(url, &init).map_err(js_err)?;
    let window = web_sys::window().ok_or_else(|| "no window".to_string())?;
    log::debug!("POST {}", url);
    let resp = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_err)?;
    let resp: Response = resp
        .dyn_into()
        .map_err(|_| "fetch returned a non-Response".to_string())?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let _ = tx.unbounded_send(StreamEvent::Started);

    let body_stream = resp.body().ok_or_else(|| "response has no body".to_string())?;
    let reader: ReadableStreamDefaultReader = body_stream
        .get_reader()
        .dyn_into()
        .map_err(|_| "body reader unavailable".to_string())?;

    let decoder = TextDecoder::new().map_err(js_err)?;
    let options = TextDecodeOptions::new();
    options.set_stream(true);

    loop {
        let chunk = JsFuture::from(reader.read()).await.map_err(js_err)?;
        let done = js_sys::Reflect::get(&chunk, &JsValue::from_str("done"))
            .map_err(js_err)?
            .as_bool()
            .unwrap_or(true);
        if done {
            break;
        }
        let value = js_sys::Reflect::get(&chunk, &JsValue::from_str("value")).map_err(js_err)?;
        let mut bytes = js_sys::Uint8Array::new(&value).to_vec();
        let text = decoder
            .decode_with_u8_array_and_options(&mut bytes, &options)
            .map_err(js_err)?;
        if text.is_empty() {
            continue;
        }
        if tx.unbounded_send(StreamEvent::Delta(text)).is_err() {
            // Consumer dropped the stream; stop reading.
            return Ok(());
        }
    }

    let _ = tx.unbounded_send(StreamEvent::Done);
    Ok(())
}

fn js_err(e: JsValue) -> String {
    format!("{e:?}")
}
