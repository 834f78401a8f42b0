#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;
    use std::rc::Rc;

    use async_trait::async_trait;
    use futures::executor::block_on;
    use futures::stream;
    use moked_types::config::WidgetConfig;
    use moked_types::message::Role;
    use moked_types::protocol::ChatRequestBody;
    use moked_types::{Result, WidgetError};

    use crate::controller::{ChatController, Phase};
    use crate::event_bus::{ChatEvent, ChatEventKind, EventBus};
    use crate::followups;
    use crate::identity::IdentityProvider;
    use crate::ports::*;

    // ─── Test doubles ────────────────────────────────────────

    struct MemoryStore {
        data: RefCell<HashMap<String, String>>,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                data: RefCell::new(HashMap::new()),
            }
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.data.borrow().get(key).cloned())
        }
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.data.borrow_mut().insert(key.into(), value.into());
            Ok(())
        }
        fn remove(&self, key: &str) -> Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }
        fn backend_name(&self) -> &str {
            "memory"
        }
    }

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(WidgetError::Storage("unavailable".into()))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(WidgetError::Storage("unavailable".into()))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(WidgetError::Storage("unavailable".into()))
        }
        fn backend_name(&self) -> &str {
            "broken"
        }
    }

    struct NoopAbort {
        count: Rc<Cell<u32>>,
    }

    impl AbortHandle for NoopAbort {
        fn abort(&self) {
            self.count.set(self.count.get() + 1);
        }
    }

    /// Transport that replays a canned event script per call.
    struct ScriptedTransport {
        scripts: RefCell<Vec<Vec<StreamEvent>>>,
        calls: Rc<Cell<u32>>,
        aborts: Rc<Cell<u32>>,
        last_body: Rc<RefCell<Option<ChatRequestBody>>>,
    }

    impl ScriptedTransport {
        fn new(scripts: Vec<Vec<StreamEvent>>) -> Self {
            Self {
                scripts: RefCell::new(scripts),
                calls: Rc::new(Cell::new(0)),
                aborts: Rc::new(Cell::new(0)),
                last_body: Rc::new(RefCell::new(None)),
            }
        }
    }

    impl ChatTransport for ScriptedTransport {
        fn stream_chat(&self, body: ChatRequestBody) -> ChatStream {
            self.calls.set(self.calls.get() + 1);
            *self.last_body.borrow_mut() = Some(body);
            let mut scripts = self.scripts.borrow_mut();
            let events = if scripts.is_empty() {
                Vec::new()
            } else {
                scripts.remove(0)
            };
            ChatStream {
                abort: Rc::new(NoopAbort {
                    count: self.aborts.clone(),
                }),
                events: Box::pin(stream::iter(events)),
            }
        }
    }

    struct InstantTimer;

    #[async_trait(?Send)]
    impl Timer for InstantTimer {
        async fn sleep_ms(&self, _ms: u32) {}
    }

    fn memory_identity() -> IdentityProvider {
        IdentityProvider::new(Rc::new(MemoryStore::new()), Rc::new(MemoryStore::new()))
    }

    fn controller_with(
        scripts: Vec<Vec<StreamEvent>>,
    ) -> (ChatController, Rc<Cell<u32>>, Rc<Cell<u32>>) {
        let transport = ScriptedTransport::new(scripts);
        let calls = transport.calls.clone();
        let aborts = transport.aborts.clone();
        let controller = ChatController::new(
            WidgetConfig::default(),
            memory_identity(),
            Rc::new(transport),
            Rc::new(InstantTimer),
            EventBus::new(),
        );
        (controller, calls, aborts)
    }

    /// Skip past the welcome sequence so the transcript starts collapsed.
    fn settle_welcome(controller: &mut ChatController) {
        block_on(controller.welcome_job().run());
        controller.pump();
    }

    // ─── EventBus ────────────────────────────────────────────

    #[test]
    fn test_event_bus_emit_and_drain() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        bus.emit(ChatEvent {
            generation: 1,
            kind: ChatEventKind::StreamStarted,
        });
        bus.emit(ChatEvent {
            generation: 1,
            kind: ChatEventKind::StreamDone,
        });
        assert!(bus.has_pending());
        assert_eq!(bus.drain().len(), 2);
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus = EventBus::new();
        let clone = bus.clone();
        clone.emit(ChatEvent {
            generation: 0,
            kind: ChatEventKind::WelcomeStep,
        });
        assert!(bus.has_pending());
    }

    // ─── Identity ────────────────────────────────────────────

    #[test]
    fn test_resource_id_is_stable() {
        let identity = memory_identity();
        let first = identity.resource_id();
        let second = identity.resource_id();
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn test_new_thread_replaces_previous() {
        let identity = memory_identity();
        let before = identity.thread_id();
        let after = identity.start_new_thread();
        assert_ne!(before, after);
        assert_eq!(identity.thread_id(), after);
    }

    #[test]
    fn test_broken_storage_yields_empty_identity() {
        let identity = IdentityProvider::new(Rc::new(BrokenStore), Rc::new(BrokenStore));
        assert!(identity.resource_id().is_empty());
        assert!(identity.start_new_thread().is_empty());
        assert!(!identity.identity().is_ready());
    }

    // ─── Follow-up extraction ────────────────────────────────

    #[test]
    fn test_extract_no_marker_is_identity() {
        let extracted = followups::extract("סתם תשובה רגילה.");
        assert_eq!(extracted.content, "סתם תשובה רגילה.");
        assert!(extracted.suggestions.is_empty());
    }

    #[test]
    fn test_extract_trailing_marker() {
        let extracted = followups::extract("Answer text [המשך: A? | B?]");
        assert_eq!(extracted.content, "Answer text");
        assert_eq!(extracted.suggestions, vec!["A?", "B?"]);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let once = followups::extract("תשובה [המשך: א | ב | ג]");
        let twice = followups::extract(&once.content);
        assert_eq!(twice.content, once.content);
        assert!(twice.suggestions.is_empty());
    }

    #[test]
    fn test_extract_ignores_mid_text_brackets() {
        let text = "ראו [כאן: קישור | עוד] ואז עוד טקסט";
        let extracted = followups::extract(text);
        assert_eq!(extracted.content, text);
        assert!(extracted.suggestions.is_empty());
    }

    #[test]
    fn test_extract_requires_label_and_pipe() {
        assert!(followups::extract("טקסט [2024]").suggestions.is_empty());
        assert!(followups::extract("טקסט [הערה: בלי מפריד]")
            .suggestions
            .is_empty());
        assert!(followups::extract("טקסט [: א | ב]").suggestions.is_empty());
    }

    #[test]
    fn test_visible_prefix_hides_unclosed_marker() {
        assert_eq!(
            followups::visible_prefix("תשובה חלקית [המשך: א |"),
            "תשובה חלקית"
        );
        let closed = "תשובה [המשך: א | ב]";
        assert_eq!(followups::visible_prefix(closed), closed);
        assert_eq!(followups::visible_prefix("ללא סוגריים"), "ללא סוגריים");
    }

    // ─── Controller: send lifecycle ──────────────────────────

    #[test]
    fn test_send_appends_user_then_assistant() {
        let (mut controller, calls, _) = controller_with(vec![vec![
            StreamEvent::Started,
            StreamEvent::Delta("אפשר לחבר ".into()),
            StreamEvent::Delta("דרך ההגדרות.".into()),
            StreamEvent::Done,
        ]]);
        settle_welcome(&mut controller);
        let baseline = controller.messages().len();

        let job = controller.begin_send("איך מחברים API?").expect("job");
        assert_eq!(controller.messages().len(), baseline + 1);
        assert_eq!(controller.messages()[baseline].role, Role::User);
        assert!(controller.is_loading());

        block_on(job.run());
        controller.pump();

        assert_eq!(calls.get(), 1);
        assert_eq!(controller.messages().len(), baseline + 2);
        let reply = controller.messages().last().unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "אפשר לחבר דרך ההגדרות.");
        assert!(!controller.is_loading());
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn test_request_carries_full_history() {
        let (mut controller, _, _) = controller_with(vec![
            vec![StreamEvent::Started, StreamEvent::Delta("a".into()), StreamEvent::Done],
            vec![StreamEvent::Started, StreamEvent::Delta("b".into()), StreamEvent::Done],
        ]);
        settle_welcome(&mut controller);

        block_on(controller.begin_send("ראשונה").unwrap().run());
        controller.pump();
        let job = controller.begin_send("שנייה").unwrap();

        // welcome + (user, assistant) + user
        assert_eq!(controller.messages().len(), 4);
        block_on(job.run());
        controller.pump();
        assert_eq!(controller.messages().len(), 5);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        let (mut controller, calls, _) = controller_with(vec![]);
        settle_welcome(&mut controller);
        assert!(controller.begin_send("   ").is_none());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_send_gated_on_identity() {
        let transport = ScriptedTransport::new(vec![]);
        let calls = transport.calls.clone();
        let mut controller = ChatController::new(
            WidgetConfig::default(),
            IdentityProvider::new(Rc::new(BrokenStore), Rc::new(BrokenStore)),
            Rc::new(transport),
            Rc::new(InstantTimer),
            EventBus::new(),
        );
        assert!(controller.begin_send("שאלה").is_none());
        assert_eq!(calls.get(), 0);
    }

    // ─── Controller: failure paths ───────────────────────────

    #[test]
    fn test_network_failure_appends_one_apology() {
        let (mut controller, _, _) = controller_with(vec![vec![StreamEvent::Error(
            "connection refused".into(),
        )]]);
        settle_welcome(&mut controller);
        let baseline = controller.messages().len();

        block_on(controller.begin_send("שאלה").unwrap().run());
        controller.pump();

        assert_eq!(controller.messages().len(), baseline + 2);
        let apology = controller.messages().last().unwrap();
        assert_eq!(apology.content, controller.config().texts.error_reply);
        assert_eq!(controller.phase(), Phase::Idle);
    }

    #[test]
    fn test_empty_stream_yields_fallback_reply() {
        let (mut controller, _, _) =
            controller_with(vec![vec![StreamEvent::Started, StreamEvent::Done]]);
        settle_welcome(&mut controller);

        block_on(controller.begin_send("שאלה").unwrap().run());
        controller.pump();

        let reply = controller.messages().last().unwrap();
        assert_eq!(reply.content, controller.config().texts.empty_reply);
    }

    // ─── Controller: single-flight cancellation ──────────────

    #[test]
    fn test_new_send_supersedes_previous() {
        // First script never reaches Done, so its abort handle stays armed.
        let (mut controller, calls, aborts) = controller_with(vec![
            vec![StreamEvent::Started, StreamEvent::Delta("ישנה".into())],
            vec![StreamEvent::Started, StreamEvent::Delta("חדשה".into()), StreamEvent::Done],
        ]);
        settle_welcome(&mut controller);

        block_on(controller.begin_send("ראשונה").unwrap().run());
        controller.pump();
        assert_eq!(controller.phase(), Phase::Streaming);

        let second = controller.begin_send("שנייה").unwrap();
        assert_eq!(aborts.get(), 1, "prior request must be aborted");
        block_on(second.run());
        controller.pump();

        assert_eq!(calls.get(), 2);
        let reply = controller.messages().last().unwrap();
        assert_eq!(reply.content, "חדשה");
    }

    #[test]
    fn test_stale_events_are_ignored() {
        let (mut controller, _, _) = controller_with(vec![vec![
            StreamEvent::Started,
            StreamEvent::Delta("עדכני".into()),
            StreamEvent::Done,
        ]]);
        settle_welcome(&mut controller);
        let baseline = controller.messages().len();

        let job = controller.begin_send("שאלה").unwrap();
        // A superseded request reporting in late must change nothing.
        controller.bus().emit(ChatEvent {
            generation: 0,
            kind: ChatEventKind::StreamFailed("aborted".into()),
        });
        controller.pump();
        assert_eq!(controller.messages().len(), baseline + 1);
        assert!(controller.is_loading());

        block_on(job.run());
        controller.pump();
        assert_eq!(controller.messages().last().unwrap().content, "עדכני");
    }

    #[test]
    fn test_superseded_job_never_hits_network() {
        let (mut controller, calls, _) = controller_with(vec![
            vec![StreamEvent::Started, StreamEvent::Done],
            vec![StreamEvent::Started, StreamEvent::Done],
        ]);
        settle_welcome(&mut controller);

        let first = controller.begin_send("ראשונה").unwrap();
        let second = controller.begin_send("שנייה").unwrap();
        // Run the superseded job after its replacement exists: the
        // generation check must stop it before the transport call.
        block_on(first.run());
        assert_eq!(calls.get(), 0);
        block_on(second.run());
        assert_eq!(calls.get(), 1);
    }

    // ─── Controller: new conversation ────────────────────────

    #[test]
    fn test_new_chat_mid_stream_aborts_and_resets() {
        let (mut controller, _, aborts) = controller_with(vec![vec![
            StreamEvent::Started,
            StreamEvent::Delta("חצי תשובה".into()),
        ]]);
        settle_welcome(&mut controller);
        let old_thread = controller.identity().thread_id();

        block_on(controller.begin_send("שאלה").unwrap().run());
        controller.pump();
        assert_eq!(controller.phase(), Phase::Streaming);

        let welcome = controller.new_conversation();
        assert_eq!(aborts.get(), 1);
        assert!(controller.messages().is_empty());
        assert_eq!(controller.phase(), Phase::Idle);
        let new_thread = controller.identity().thread_id();
        assert_ne!(old_thread, new_thread);

        block_on(welcome.run());
        controller.pump();
        assert_eq!(controller.messages().len(), 1);
    }

    // ─── Controller: welcome sequence ────────────────────────

    #[test]
    fn test_welcome_collapses_into_single_message() {
        let (mut controller, _, _) = controller_with(vec![]);
        assert!(controller.welcome_revealed().is_some());

        block_on(controller.welcome_job().run());
        controller.pump();

        assert!(controller.welcome_revealed().is_none());
        assert_eq!(controller.messages().len(), 1);
        let welcome = &controller.messages()[0];
        assert_eq!(welcome.role, Role::Assistant);
        assert_eq!(welcome.content, controller.config().welcome_as_message());
    }

    #[test]
    fn test_send_during_welcome_collapses_first() {
        let (mut controller, _, _) = controller_with(vec![vec![
            StreamEvent::Started,
            StreamEvent::Done,
        ]]);
        let job = controller.begin_send("שאלה").unwrap();
        // collapsed welcome followed by the user message
        assert_eq!(controller.messages().len(), 2);
        assert_eq!(controller.messages()[0].role, Role::Assistant);
        assert_eq!(controller.messages()[1].role, Role::User);
        assert!(controller.welcome_revealed().is_none());
        block_on(job.run());
    }

    // ─── Controller: follow-up chips ─────────────────────────

    #[test]
    fn test_followups_surface_and_clear() {
        let (mut controller, _, _) = controller_with(vec![
            vec![
                StreamEvent::Started,
                StreamEvent::Delta("תשובה מלאה ".into()),
                StreamEvent::Delta("[המשך: ספר לי עוד | יש דוגמה?]".into()),
                StreamEvent::Done,
            ],
            vec![StreamEvent::Started, StreamEvent::Done],
        ]);
        settle_welcome(&mut controller);

        block_on(controller.begin_send("שאלה").unwrap().run());
        controller.pump();

        assert_eq!(controller.messages().last().unwrap().content, "תשובה מלאה");
        assert_eq!(
            controller.suggestions(),
            ["ספר לי עוד", "יש דוגמה?"]
        );
        assert!(controller.show_follow_ups());

        let job = controller.begin_send("ספר לי עוד").unwrap();
        assert!(controller.suggestions().is_empty());
        block_on(job.run());
    }

    #[test]
    fn test_streaming_hides_unclosed_marker() {
        let (mut controller, _, _) = controller_with(vec![vec![
            StreamEvent::Started,
            StreamEvent::Delta("תשובה [המשך: א |".into()),
        ]]);
        settle_welcome(&mut controller);

        block_on(controller.begin_send("שאלה").unwrap().run());
        controller.pump();

        assert_eq!(controller.streaming_visible(), Some("תשובה"));
    }
}
