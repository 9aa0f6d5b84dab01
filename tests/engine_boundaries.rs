
use pretty_assertions::assert_eq;

use chat_dom::core::locator::{locate, Selector};
use chat_dom::{
    Document, Engine, EngineConfig, EngineError, MarkdownRenderer, NodeId, RenderError, Renderer,
    SafeHtml, UsageLevel,
};

use fixture::{deliver_live, event, read_events};

fn descendants(doc: &Document, node: NodeId, out: &mut Vec<NodeId>) {
    for child in doc.children(node) {
        out.push(*child);
        descendants(doc, *child, out);
    }
}

fn elements_with_attr(doc: &Document, root: NodeId, name: &str) -> Vec<NodeId> {
    let mut nodes = Vec::new();
    descendants(doc, root, &mut nodes);
    nodes.retain(|node| doc.has_attr(*node, name));
    nodes
}

fn mid_turn(engine: &mut Engine) {
    for raw in [
        r#"{"type":"user_message","data":{"id":"u1","text":"hi"}}"#,
        r#"{"type":"turn_start","data":{}}"#,
        r#"{"type":"message_delta","data":{"id":"m1","delta":"partial"}}"#,
        r#"{"type":"context_usage","data":{"used_tokens":170000,"max_tokens":200000,"model":"gpt-5"}}"#,
        r#"{"type":"applet_open","data":{"id":"diff","title":"Diff","markup":[]}}"#,
    ] {
        engine.handle(&event(raw)).expect("event applies");
    }
    assert_eq!(engine.pending_renders(), 1);
}

#[test]
fn session_switch_leaves_nothing_behind() {
    let baseline = Engine::new().document().live_nodes();
    let mut engine = Engine::new();
    mid_turn(&mut engine);
    let transcript = engine.region_root("transcript").expect("transcript");
    let stale_group = engine.document().children(transcript)[0];

    engine
        .handle(&event(r#"{"type":"session_switch","data":{"session_id":"s-2"}}"#))
        .expect("switch");

    assert_eq!(engine.session_id(), Some("s-2"));
    assert!(engine.document().children(transcript).is_empty());
    assert_eq!(engine.pending_renders(), 0);
    assert_eq!(engine.context_usage(), None);
    assert!(engine.applet_ids().is_empty());
    assert_eq!(engine.region_html("contextFooter").expect("footer"), "");
    assert!(!engine.owner("appletPanel").expect("panel").is_visible(engine.document()));
    assert_eq!(engine.document().live_nodes(), baseline);
    assert!(!engine.document().contains(stale_group));

    let revision = engine.document().revision();
    assert_eq!(engine.advance(10_000), 0);
    assert_eq!(engine.document().revision(), revision);
}

#[test]
fn replay_start_clears_and_replay_end_flushes() {
    let mut engine = Engine::new();
    mid_turn(&mut engine);

    engine
        .handle(&event(r#"{"type":"history_replay_start","data":{"session_id":"s-1"}}"#))
        .expect("replay start");
    assert!(engine.is_replaying());
    assert_eq!(engine.pending_renders(), 0);
    assert_eq!(engine.snapshot().groups.len(), 0);

    engine
        .handle(&event(r#"{"type":"message_delta","data":{"id":"m9","delta":"tail only"}}"#))
        .expect("delta");
    assert_eq!(engine.pending_renders(), 1);
    engine
        .handle(&event(r#"{"type":"history_replay_end","data":{}}"#))
        .expect("replay end");

    assert!(!engine.is_replaying());
    assert_eq!(engine.session_id(), Some("s-1"));
    assert_eq!(engine.pending_renders(), 0);
    let transcript = engine.region_root("transcript").expect("transcript");
    assert_eq!(engine.document().text_content(transcript), "tail only");
}

#[test]
fn clearing_the_transcript_cancels_batched_renders() {
    let mut engine = Engine::new();
    mid_turn(&mut engine);
    engine.clear_region("transcript").expect("declared region");

    assert_eq!(engine.pending_renders(), 0);
    assert!(engine.snapshot().groups.is_empty());
    // Other regions keep their content.
    assert!(engine.context_usage().is_some());
    assert_eq!(engine.applet_ids(), vec!["diff"]);
}

#[test]
fn undeclared_regions_follow_the_strictness_setting() {
    let mut strict = Engine::with_config(EngineConfig::default().with_strict_regions(true));
    let err = strict.clear_region("sidebar").expect_err("strict mode reports");
    assert!(matches!(err, EngineError::UnknownRegion { ref name } if name == "sidebar"));
    assert!(strict.set_region_visible("sidebar", true).is_err());

    let mut lenient = Engine::with_config(EngineConfig::default().with_strict_regions(false));
    let revision = lenient.document().revision();
    lenient.clear_region("sidebar").expect("ignored");
    lenient.set_region_visible("sidebar", false).expect("ignored");
    assert_eq!(lenient.document().revision(), revision);

    assert!(lenient.owner("sidebar").is_err());
    assert!(lenient.region_root("sidebar").is_err());
}

#[test]
fn region_visibility_is_owned_by_the_region() {
    let mut engine = Engine::new();
    let panel = engine.region_root("appletPanel").expect("panel");
    assert!(engine.document().has_attr(panel, "hidden"));

    engine.set_region_visible("appletPanel", true).expect("declared");
    assert!(!engine.document().has_attr(panel, "hidden"));
    assert!(engine.owner("appletPanel").expect("panel").is_visible(engine.document()));

    engine.set_region_visible("appletPanel", false).expect("declared");
    assert!(engine.document().has_attr(panel, "hidden"));
}

#[test]
fn toggling_rejects_non_slots_and_detached_nodes() {
    let mut engine = Engine::new();
    engine
        .handle(&event(r#"{"type":"tool_start","data":{"id":"t1","name":"ls"}}"#))
        .expect("tool start");
    let transcript = engine.region_root("transcript").expect("transcript");
    let group = engine.document().children(transcript)[0];
    let tool = engine.document().children(group)[0];

    assert!(matches!(engine.toggle_slot(group), Err(EngineError::NotASlot(_))));
    let footer = engine.region_root("contextFooter").expect("footer");
    assert!(matches!(engine.toggle_slot(footer), Err(EngineError::NotASlot(_))));

    engine
        .handle(&event(r#"{"type":"session_switch","data":{"session_id":"s-2"}}"#))
        .expect("switch");
    assert!(matches!(engine.toggle_slot(tool), Err(EngineError::Detached(_))));
}

#[test]
fn failing_renderer_falls_back_to_plain_text() {
    let rejecting = |_: &str| -> Result<SafeHtml, RenderError> {
        Err(RenderError::Rejected("unsupported".to_string()))
    };
    let mut engine = Engine::with_renderer(EngineConfig::default(), rejecting);
    engine
        .handle(&event(r#"{"type":"message","data":{"id":"m1","text":"**bold** <b>"}}"#))
        .expect("fallback is not an error");

    let transcript = engine.region_root("transcript").expect("transcript");
    let group = engine.document().children(transcript)[0];
    let slot = engine.document().children(group)[0];
    assert_eq!(engine.document().inner_html(slot), "**bold** &lt;b&gt;");
    assert!(!engine.document().has_class(slot, "rendered"));
}

#[test]
fn panicking_renderer_is_contained_per_write() {
    let flaky = |raw: &str| -> Result<SafeHtml, RenderError> {
        if raw.contains("boom") {
            panic!("renderer exploded");
        }
        MarkdownRenderer::new().render(raw)
    };
    let mut engine = Engine::with_renderer(EngineConfig::default(), flaky);
    let report = engine.handle_json_lines(concat!(
        "{\"type\":\"message\",\"data\":{\"id\":\"m1\",\"text\":\"boom *now*\"}}\n",
        "{\"type\":\"message\",\"data\":{\"id\":\"m2\",\"text\":\"fine *now*\"}}\n",
    ));
    assert!(report.is_clean());

    let snapshot = engine.snapshot();
    let slots = &snapshot.groups[0].slots;
    assert_eq!(slots[0].html, "boom *now*");
    assert_eq!(slots[1].html, "<p>fine <em>now</em></p>");
}

#[test]
fn json_lines_report_undecodable_input() {
    let mut engine = Engine::new();
    let report = engine.handle_json_lines(concat!(
        "{\"type\":\"notice\",\"data\":{\"text\":\"one\"}}\n",
        "{\"type\":\"no_such_event\",\"data\":{}}\n",
        "\n",
        "{broken\n",
        "{\"type\":\"notice\",\"data\":{\"text\":\"two\"}}\n",
    ));
    assert_eq!(report.handled, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(report.decode_errors, 2);
    assert!(!report.is_clean());
}

#[test]
fn hostile_content_cannot_impersonate_structure() {
    let mut engine = Engine::new();
    deliver_live(&mut engine, &read_events("adversarial.jsonl"));
    let doc = engine.document();

    let app = locate(doc, doc.root(), Selector::StaticId("app")).expect("app shell");
    let transcript = engine.region_root("transcript").expect("transcript");
    let footer = engine.region_root("contextFooter").expect("footer");
    assert_eq!(locate(doc, app, Selector::Landmark("context-footer")), Some(footer));
    assert_eq!(locate(doc, app, Selector::StaticId("transcript")), Some(transcript));

    for attr in ["id", "data-landmark", "onclick", "data-applet"] {
        assert_eq!(elements_with_attr(doc, transcript, attr), Vec::<NodeId>::new(), "{attr}");
    }

    // Every slot-looking element is a real slot: a direct child of a group in the region.
    for attr in ["data-slot", "data-key"] {
        for slot in elements_with_attr(doc, transcript, attr) {
            let group = doc.parent(slot).expect("slot has a parent");
            assert!(doc.has_attr(group, "data-group"), "{attr} outside a group");
            assert_eq!(doc.parent(group), Some(transcript));
        }
    }

    let mut nodes = Vec::new();
    descendants(doc, transcript, &mut nodes);
    let tags: Vec<_> = nodes.iter().filter_map(|node| doc.tag(*node)).collect();
    assert!(!tags.contains(&"script"));
    assert!(!tags.contains(&"iframe"));

    let tools: Vec<_> = engine
        .snapshot()
        .groups
        .iter()
        .flat_map(|group| group.slots.clone())
        .filter(|slot| slot.key.as_deref() == Some("t1"))
        .collect();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].tool_name.as_deref(), Some("cat"));
}

#[test]
fn footer_and_applets_follow_their_events() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"context_usage","data":{"used_tokens":190000,"max_tokens":200000,"model":"gpt-5"}}"#),
            event(r#"{"type":"applet_open","data":{"id":"a","title":"A","markup":[]}}"#),
            event(r#"{"type":"applet_open","data":{"id":"b","title":"B","markup":[]}}"#),
            event(r#"{"type":"applet_update","data":{"id":"missing","markup":[]}}"#),
            event(r#"{"type":"applet_close","data":{"id":"a"}}"#),
        ],
    );

    let usage = engine.context_usage().expect("usage recorded");
    assert_eq!(usage.level(), UsageLevel::Critical);
    let footer = engine.region_root("contextFooter").expect("footer");
    let doc = engine.document();
    let meter = doc.children(footer)[0];
    assert_eq!(doc.attr(meter, "data-usage-level"), Some("critical"));

    assert_eq!(engine.applet_ids(), vec!["b"]);
    let panel = engine.region_root("appletPanel").expect("panel");
    assert!(!doc.has_attr(panel, "hidden"));

    engine
        .handle(&event(r#"{"type":"applet_close","data":{"id":"b"}}"#))
        .expect("close");
    assert!(engine.document().has_attr(panel, "hidden"));
}
