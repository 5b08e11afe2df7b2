//! Minimal Socket.IO v5 client for the task log room.
//!
//! Speaks Engine.IO v4 over a plain `WebSocket`: answers pings, joins the
//! task room once the namespace is connected and forwards `log_message`
//! events. Reconnects a bounded number of times with a fixed delay.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use gloo_timers::callback::Timeout;
use log::{debug, info, warn};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::{CloseEvent, Event, MessageEvent, WebSocket};

use super::record::LogRecord;

const SOCKET_PATH: &str = "/socket.io/?EIO=4&transport=websocket";
const CONNECT_FRAME: &str = "40";
const PONG_FRAME: &str = "3";
const JOIN_EVENT: &str = "join";
const LOG_EVENT: &str = "log_message";

/// A decoded Engine.IO/Socket.IO text frame.
#[derive(Clone, Debug, PartialEq)]
pub enum Frame {
	/// Engine.IO handshake; the namespace connect goes out next.
	Open,
	Ping,
	Close,
	/// Namespace connected.
	Connect,
	ConnectError(String),
	Disconnect,
	Event { name: String, payload: Value },
	Unknown,
}

pub fn decode_frame(text: &str) -> Frame {
	let mut chars = text.chars();
	match chars.next() {
		Some('0') => Frame::Open,
		Some('1') => Frame::Close,
		Some('2') => Frame::Ping,
		Some('4') => decode_packet(chars.as_str()),
		_ => Frame::Unknown,
	}
}

fn decode_packet(body: &str) -> Frame {
	let mut chars = body.chars();
	let kind = chars.next();
	let rest = chars.as_str();
	match kind {
		Some('0') => Frame::Connect,
		Some('1') => Frame::Disconnect,
		Some('2') => decode_event(rest),
		Some('4') => Frame::ConnectError(rest.to_string()),
		_ => Frame::Unknown,
	}
}

fn decode_event(body: &str) -> Frame {
	// optional namespace ("/ns,") and ack id precede the JSON array
	let body = match body.strip_prefix('/') {
		Some(ns) => ns.split_once(',').map(|(_, rest)| rest).unwrap_or(""),
		None => body,
	};
	let body = body.trim_start_matches(|c: char| c.is_ascii_digit());
	let Ok(Value::Array(mut items)) = serde_json::from_str::<Value>(body) else {
		return Frame::Unknown;
	};
	if items.is_empty() {
		return Frame::Unknown;
	}
	let Value::String(name) = items.remove(0) else {
		return Frame::Unknown;
	};
	let payload = if items.is_empty() {
		Value::Null
	} else {
		items.remove(0)
	};
	Frame::Event { name, payload }
}

pub fn encode_event(name: &str, payload: &Value) -> String {
	format!("42{}", Value::Array(vec![Value::from(name), payload.clone()]))
}

/// WebSocket endpoint of the push channel for an HTTP API base URL.
pub fn socket_url(api_base: &str) -> String {
	let base = api_base.trim_end_matches('/');
	let base = if let Some(rest) = base.strip_prefix("https://") {
		format!("wss://{rest}")
	} else if let Some(rest) = base.strip_prefix("http://") {
		format!("ws://{rest}")
	} else {
		base.to_string()
	};
	format!("{base}{SOCKET_PATH}")
}

#[derive(Clone, Debug, PartialEq)]
pub enum ChannelEvent {
	Connected,
	Disconnected,
	Record(LogRecord),
}

#[derive(Clone, Debug)]
pub struct ChannelOptions {
	pub url: String,
	pub task_id: String,
	pub reconnect_attempts: u32,
	pub reconnect_delay_ms: u32,
}

/// Bounded fixed-delay reconnection. A namespace connect restores the full budget.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
	max_attempts: u32,
	delay_ms: u32,
	failures: u32,
	closed: bool,
}

impl ReconnectPolicy {
	pub fn new(max_attempts: u32, delay_ms: u32) -> Self {
		Self {
			max_attempts,
			delay_ms,
			failures: 0,
			closed: false,
		}
	}

	/// Delay before the next attempt, or `None` once attempts are spent or
	/// the channel was closed.
	pub fn next_delay(&mut self) -> Option<u32> {
		if self.closed || self.failures >= self.max_attempts {
			return None;
		}
		self.failures += 1;
		Some(self.delay_ms)
	}

	pub fn observe(&mut self, frame: &Frame) {
		if *frame == Frame::Connect {
			self.failures = 0;
		}
	}

	/// Returns whether the policy was still open.
	pub fn close(&mut self) -> bool {
		!std::mem::replace(&mut self.closed, true)
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}

	pub fn attempts(&self) -> u32 {
		self.failures
	}
}

struct Socket {
	ws: WebSocket,
	_on_message: Closure<dyn FnMut(MessageEvent)>,
	_on_close: Closure<dyn FnMut(CloseEvent)>,
	_on_error: Closure<dyn FnMut(Event)>,
}

impl Socket {
	fn detach(&self) {
		self.ws.set_onmessage(None);
		self.ws.set_onclose(None);
		self.ws.set_onerror(None);
		let _ = self.ws.close();
	}
}

struct ChannelInner {
	options: ChannelOptions,
	policy: Cell<ReconnectPolicy>,
	connected: Cell<bool>,
	socket: RefCell<Option<Socket>>,
	retry: RefCell<Option<Timeout>>,
	on_event: Box<dyn Fn(ChannelEvent)>,
}

impl ChannelInner {
	fn with_policy<R>(&self, f: impl FnOnce(&mut ReconnectPolicy) -> R) -> R {
		let mut policy = self.policy.get();
		let out = f(&mut policy);
		self.policy.set(policy);
		out
	}

	fn is_closed(&self) -> bool {
		self.policy.get().is_closed()
	}
}

/// Live subscription to one task's log room. Closing is final.
pub struct LogChannel {
	inner: Rc<ChannelInner>,
}

impl LogChannel {
	pub fn open(options: ChannelOptions, on_event: impl Fn(ChannelEvent) + 'static) -> Self {
		info!("log channel: subscribing to task {}", options.task_id);
		let policy = ReconnectPolicy::new(options.reconnect_attempts, options.reconnect_delay_ms);
		let inner = Rc::new(ChannelInner {
			options,
			policy: Cell::new(policy),
			connected: Cell::new(false),
			socket: RefCell::new(None),
			retry: RefCell::new(None),
			on_event: Box::new(on_event),
		});
		connect(&inner);
		Self { inner }
	}

	pub fn close(&self) {
		let inner = &self.inner;
		if !inner.with_policy(ReconnectPolicy::close) {
			return;
		}
		debug!("log channel: closing task {}", inner.options.task_id);
		inner.retry.borrow_mut().take();
		if let Some(socket) = inner.socket.borrow_mut().take() {
			socket.detach();
		}
	}
}

impl Drop for LogChannel {
	fn drop(&mut self) {
		self.close();
	}
}

fn connect(inner: &Rc<ChannelInner>) {
	if inner.is_closed() {
		return;
	}
	let ws = match WebSocket::new(&inner.options.url) {
		Ok(ws) => ws,
		Err(err) => {
			warn!("log channel: cannot open {}: {err:?}", inner.options.url);
			schedule_reconnect(inner);
			return;
		}
	};

	let weak = Rc::downgrade(inner);
	let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
		let Some(inner) = weak.upgrade() else {
			return;
		};
		if let Some(text) = ev.data().as_string() {
			handle_frame(&inner, &text);
		}
	});
	let weak = Rc::downgrade(inner);
	let on_close = Closure::<dyn FnMut(CloseEvent)>::new(move |ev: CloseEvent| {
		debug!("log channel: socket closed ({})", ev.code());
		if let Some(inner) = weak.upgrade() {
			handle_closed(&inner);
		}
	});
	let on_error = Closure::<dyn FnMut(Event)>::new(move |_: Event| {
		debug!("log channel: socket error");
	});

	ws.set_onmessage(Some(on_message.as_ref().unchecked_ref()));
	ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));
	ws.set_onerror(Some(on_error.as_ref().unchecked_ref()));

	let previous = inner.socket.borrow_mut().replace(Socket {
		ws,
		_on_message: on_message,
		_on_close: on_close,
		_on_error: on_error,
	});
	if let Some(old) = previous {
		old.detach();
	}
}

fn send(inner: &ChannelInner, frame: &str) {
	if let Some(ref socket) = *inner.socket.borrow() {
		if let Err(err) = socket.ws.send_with_str(frame) {
			warn!("log channel: send failed: {err:?}");
		}
	}
}

fn handle_frame(inner: &Rc<ChannelInner>, text: &str) {
	if inner.is_closed() {
		return;
	}
	let frame = decode_frame(text);
	inner.with_policy(|p| p.observe(&frame));
	match frame {
		Frame::Open => send(inner, CONNECT_FRAME),
		Frame::Ping => send(inner, PONG_FRAME),
		Frame::Connect => {
			inner.connected.set(true);
			(inner.on_event)(ChannelEvent::Connected);
			send(
				inner,
				&encode_event(JOIN_EVENT, &Value::from(inner.options.task_id.as_str())),
			);
		}
		Frame::Event { name, payload } if name == LOG_EVENT => {
			match serde_json::from_value::<LogRecord>(payload) {
				Ok(record) => (inner.on_event)(ChannelEvent::Record(record)),
				Err(err) => warn!("log channel: malformed log record: {err}"),
			}
		}
		Frame::Event { name, .. } => debug!("log channel: ignoring event {name}"),
		Frame::ConnectError(reason) => warn!("log channel: connect refused: {reason}"),
		// the close event drives the reconnect
		Frame::Close | Frame::Disconnect => {
			if let Some(ref socket) = *inner.socket.borrow() {
				let _ = socket.ws.close();
			}
		}
		Frame::Unknown => debug!("log channel: unrecognised frame {text}"),
	}
}

fn handle_closed(inner: &Rc<ChannelInner>) {
	if inner.is_closed() {
		return;
	}
	if inner.connected.replace(false) {
		(inner.on_event)(ChannelEvent::Disconnected);
	}
	schedule_reconnect(inner);
}

fn schedule_reconnect(inner: &Rc<ChannelInner>) {
	let Some(delay) = inner.with_policy(ReconnectPolicy::next_delay) else {
		if !inner.is_closed() {
			warn!(
				"log channel: giving up on task {} after {} attempts",
				inner.options.task_id, inner.options.reconnect_attempts
			);
		}
		return;
	};
	debug!("log channel: reconnect attempt {}", inner.policy.get().attempts());
	let weak: Weak<ChannelInner> = Rc::downgrade(inner);
	let timeout = Timeout::new(delay, move || {
		if let Some(inner) = weak.upgrade() {
			connect(&inner);
		}
	});
	*inner.retry.borrow_mut() = Some(timeout);
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;
	use crate::components::log_viewer::record::LogLevel;

	#[test]
	fn engine_control_frames() {
		assert_eq!(
			decode_frame(r#"0{"sid":"abc","pingInterval":25000}"#),
			Frame::Open
		);
		assert_eq!(decode_frame("2"), Frame::Ping);
		assert_eq!(decode_frame("40"), Frame::Connect);
		assert_eq!(decode_frame(r#"40{"sid":"x"}"#), Frame::Connect);
		assert_eq!(decode_frame("41"), Frame::Disconnect);
		assert_eq!(decode_frame(""), Frame::Unknown);
	}

	#[test]
	fn log_event_decodes_to_record() {
		let frame = decode_frame(
			r#"42["log_message",{"timestamp":"2024-11-27T10:00:00","level":"INFO","message":"Crawling"}]"#,
		);
		let Frame::Event { name, payload } = frame else {
			panic!("expected event, got {frame:?}");
		};
		assert_eq!(name, "log_message");
		let record: LogRecord = serde_json::from_value(payload).unwrap();
		assert_eq!(record.level, LogLevel::Info);
		assert_eq!(record.message, "Crawling");
	}

	#[test]
	fn namespaced_event_with_ack_id() {
		let frame = decode_frame(r#"42/logs,7["log_message",{"message":"m"}]"#);
		assert!(matches!(frame, Frame::Event { ref name, .. } if name == "log_message"));
	}

	#[test]
	fn join_is_encoded_as_event_array() {
		assert_eq!(
			encode_event("join", &json!("task-42")),
			r#"42["join","task-42"]"#
		);
	}

	#[test]
	fn reconnect_gives_up_after_budget() {
		let mut policy = ReconnectPolicy::new(5, 1000);
		for attempt in 1..=5 {
			assert_eq!(policy.next_delay(), Some(1000));
			assert_eq!(policy.attempts(), attempt);
		}
		assert_eq!(policy.next_delay(), None);
		assert_eq!(policy.attempts(), 5);
	}

	#[test]
	fn namespace_connect_restores_reconnect_budget() {
		let mut policy = ReconnectPolicy::new(2, 1000);
		policy.next_delay();
		policy.next_delay();
		policy.observe(&decode_frame("2"));
		assert_eq!(policy.next_delay(), None);

		policy.observe(&decode_frame("40"));
		assert_eq!(policy.attempts(), 0);
		assert_eq!(policy.next_delay(), Some(1000));
	}

	#[test]
	fn closed_channel_never_reconnects() {
		let mut policy = ReconnectPolicy::new(5, 1000);
		assert_eq!(policy.next_delay(), Some(1000));
		assert!(policy.close());
		assert!(!policy.close());
		assert_eq!(policy.next_delay(), None);
		policy.observe(&Frame::Connect);
		assert_eq!(policy.next_delay(), None);
	}

	#[test]
	fn socket_url_follows_scheme() {
		assert_eq!(
			socket_url("http://localhost:5009/"),
			"ws://localhost:5009/socket.io/?EIO=4&transport=websocket"
		);
		assert_eq!(
			socket_url("https://kb.example.org"),
			"wss://kb.example.org/socket.io/?EIO=4&transport=websocket"
		);
	}
}
