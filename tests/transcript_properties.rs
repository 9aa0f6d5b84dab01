
use pretty_assertions::assert_eq;

use chat_dom::runtime::activity::{clear_placeholder, start_turn};
use chat_dom::runtime::inserter::{resolve_group, resolve_slot};
use chat_dom::runtime::ContentWriter;
use chat_dom::{
    Document, Engine, EngineConfig, GroupTag, MarkdownRenderer, NodeId, Renderer, SlotTag,
    StreamRenderMode,
};

use fixture::{deliver_live, event, read_events, read_history};

fn groups(engine: &Engine) -> Vec<NodeId> {
    let root = engine.region_root("transcript").expect("transcript is declared");
    engine.document().children(root).to_vec()
}

fn rendered(raw: &str) -> String {
    MarkdownRenderer::new()
        .render(raw)
        .expect("default renderer is total")
        .to_html()
}

fn contains_stream_tail(doc: &Document, node: NodeId) -> bool {
    doc.has_attr(node, "data-stream-tail")
        || doc
            .children(node)
            .iter()
            .any(|child| contains_stream_tail(doc, *child))
}

#[test]
fn consecutive_same_tag_events_share_one_group() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"turn_start","data":{}}"#),
            event(r#"{"type":"intent","data":{"text":"Reading"}}"#),
            event(r#"{"type":"tool_start","data":{"id":"t1","name":"cat"}}"#),
        ],
    );

    let groups = groups(&engine);
    assert_eq!(groups.len(), 1);
    let doc = engine.document();
    assert_eq!(doc.attr(groups[0], "data-group"), Some("activity"));
    let tags: Vec<_> = doc
        .children(groups[0])
        .iter()
        .map(|slot| doc.attr(*slot, "data-slot"))
        .collect();
    assert_eq!(tags, vec![Some("intent"), Some("tool")]);
}

#[test]
fn unkeyed_notices_accumulate_inside_one_group() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"notice","data":{"text":"Reconnected"}}"#),
            event(r#"{"type":"notice","data":{"text":"Session saved"}}"#),
        ],
    );

    let groups = groups(&engine);
    assert_eq!(groups.len(), 1);
    assert_eq!(engine.document().text_content(groups[0]), "ReconnectedSession saved");
}

#[test]
fn a_different_tag_always_starts_a_new_group() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"turn_start","data":{}}"#),
            event(r#"{"type":"intent","data":{"text":"Thinking about it"}}"#),
            event(r#"{"type":"message","data":{"id":"m1","text":"Done."}}"#),
            event(r#"{"type":"intent","data":{"text":"One more check"}}"#),
        ],
    );

    let doc = engine.document();
    let tags: Vec<_> = groups(&engine)
        .iter()
        .map(|group| doc.attr(*group, "data-group"))
        .collect();
    assert_eq!(tags, vec![Some("activity"), Some("assistant"), Some("activity")]);
}

#[test]
fn placeholder_removal_is_scoped_to_its_group() {
    let mut doc = Document::new();
    let region = doc.root();
    let writer = ContentWriter::new(MarkdownRenderer::new(), 80);

    let earlier = resolve_group(&mut doc, region, GroupTag::User);
    let earlier_slot = resolve_slot(&mut doc, earlier, SlotTag::UserText, None);
    let placeholder = start_turn(&mut doc, &writer, region);
    let group = doc.parent(placeholder).expect("placeholder lives in a group");
    // A real slot that landed before the placeholder was cleared.
    let real = resolve_slot(&mut doc, group, SlotTag::Tool, Some("t1"));

    assert!(clear_placeholder(&mut doc, group));
    assert!(!doc.contains(placeholder));
    assert!(doc.is_attached(real));
    assert_eq!(doc.children(group), &[real]);
    assert_eq!(doc.children(earlier), &[earlier_slot]);
    assert_eq!(doc.children(region), &[earlier, group]);

    let revision = doc.revision();
    assert!(!clear_placeholder(&mut doc, group));
    assert_eq!(doc.revision(), revision);
}

#[test]
fn repeated_keyed_events_update_a_single_slot() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"turn_start","data":{}}"#),
            event(r#"{"type":"tool_start","data":{"id":"t1","name":"grep"}}"#),
            event(r#"{"type":"tool_start","data":{"id":"t1","name":"grep"}}"#),
            event(r#"{"type":"message","data":{"id":"m1","text":"first"}}"#),
            event(r#"{"type":"message","data":{"id":"m1","text":"second"}}"#),
            event(r#"{"type":"tool_end","data":{"id":"t1","output":"ok"}}"#),
        ],
    );

    let snapshot = engine.snapshot();
    let keys: Vec<_> = snapshot
        .groups
        .iter()
        .flat_map(|group| group.slots.iter().map(|slot| slot.key.as_deref()))
        .collect();
    assert_eq!(keys, vec![Some("t1"), Some("m1")]);
    assert_eq!(snapshot.groups[1].slots[0].html, rendered("second"));
    assert_eq!(snapshot.groups[0].slots[0].html, rendered("ok"));
    assert_eq!(snapshot.groups[0].slots[0].status.as_deref(), Some("done"));
}

#[test]
fn finalize_renders_the_concatenated_deltas_once() {
    let mut engine = Engine::new();
    engine
        .handle(&event(r#"{"type":"turn_start","data":{}}"#))
        .expect("turn start");
    for delta in ["Hello ", "**wor", "ld**"] {
        let raw = format!(r#"{{"type":"message_delta","data":{{"id":"m1","delta":"{delta}"}}}}"#);
        engine.handle(&event(&raw)).expect("delta");
        engine.advance(10);
    }
    assert_eq!(engine.pending_renders(), 1);
    engine
        .handle(&event(r#"{"type":"turn_end","data":{}}"#))
        .expect("turn end");

    let snapshot = engine.snapshot();
    let slot = &snapshot.groups[0].slots[0];
    assert_eq!(slot.html, rendered("Hello **world**"));
    assert_eq!(engine.pending_renders(), 0);
    let root = engine.region_root("transcript").expect("transcript");
    assert!(!contains_stream_tail(engine.document(), root));
}

#[test]
fn authoritative_final_text_replaces_the_stream() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"turn_start","data":{}}"#),
            event(r#"{"type":"reasoning_delta","data":{"id":"r1","delta":"draft one"}}"#),
            event(r#"{"type":"reasoning_delta","data":{"id":"r1","delta":" draft two"}}"#),
            event(r#"{"type":"reasoning","data":{"id":"r1","text":"Final *answer*"}}"#),
        ],
    );

    let snapshot = engine.snapshot();
    assert_eq!(snapshot.groups[0].slots[0].html, rendered("Final *answer*"));
    let root = engine.region_root("transcript").expect("transcript");
    assert!(!contains_stream_tail(engine.document(), root));
}

#[test]
fn late_delta_cannot_overwrite_a_final_message() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"turn_start","data":{}}"#),
            event(r#"{"type":"message","data":{"id":"m1","text":"Complete **answer**"}}"#),
            event(r#"{"type":"message_delta","data":{"id":"m1","delta":"x"}}"#),
        ],
    );
    assert_eq!(engine.pending_renders(), 0);
    assert_eq!(engine.snapshot().groups[0].slots[0].html, rendered("Complete **answer**"));

    deliver_live(&mut engine, &[event(r#"{"type":"turn_end","data":{}}"#)]);
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.groups.len(), 1);
    assert_eq!(snapshot.groups[0].slots.len(), 1);
    assert_eq!(snapshot.groups[0].slots[0].html, rendered("Complete **answer**"));
}

#[test]
fn markdown_stream_mode_renders_each_batch() {
    let config = EngineConfig::default().with_stream_mode(StreamRenderMode::Markdown);
    let mut engine = Engine::with_config(config);
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"message_delta","data":{"id":"m1","delta":"**bo"}}"#),
            event(r#"{"type":"message_delta","data":{"id":"m1","delta":"ld**"}}"#),
        ],
    );
    assert_eq!(engine.snapshot().groups[0].slots[0].html, "<p><strong>bold</strong></p>");
    let root = engine.region_root("transcript").expect("transcript");
    assert!(!contains_stream_tail(engine.document(), root));
}

#[test]
fn streaming_slot_shows_a_tail_between_batches() {
    let mut engine = Engine::new();
    engine
        .handle(&event(r#"{"type":"message_delta","data":{"id":"m1","delta":"Hi"}}"#))
        .expect("delta");
    assert_eq!(engine.advance(engine.config().batch_ms), 1);

    let root = engine.region_root("transcript").expect("transcript");
    assert!(contains_stream_tail(engine.document(), root));
    let slot = &engine.snapshot().groups[0].slots[0];
    assert_eq!(
        slot.html,
        "<span class=\"stream-tail\" data-stream-tail=\"\">Hi</span>"
    );
}

#[test]
fn tool_activity_scenario() {
    let mut engine = Engine::new();
    deliver_live(&mut engine, &read_events("tool_scenario.jsonl"));

    let groups = groups(&engine);
    assert_eq!(groups.len(), 1);
    let doc = engine.document();
    assert_eq!(doc.attr(groups[0], "data-group"), Some("activity"));
    assert_eq!(doc.attr(groups[0], "data-state"), Some("finalized"));

    let slots = doc.children(groups[0]);
    assert_eq!(slots.len(), 2);
    assert_eq!(doc.attr(slots[0], "data-slot"), Some("intent"));
    assert_eq!(doc.inner_html(slots[0]), "Searching files");

    assert_eq!(doc.attr(slots[1], "data-slot"), Some("tool"));
    assert_eq!(doc.attr(slots[1], "data-key"), Some("t1"));
    assert_eq!(doc.attr(slots[1], "data-tool-name"), Some("grep"));
    assert_eq!(doc.inner_html(slots[1]), rendered("line1\nline2\n"));
    assert!(!contains_stream_tail(doc, groups[0]));

    let placeholders = slots
        .iter()
        .filter(|slot| doc.attr(**slot, "data-slot") == Some("thinking"))
        .count();
    assert_eq!(placeholders, 0);
}

#[test]
fn replay_reproduces_live_delivery() {
    let mut live = Engine::new();
    deliver_live(&mut live, &read_events("live_session.jsonl"));

    let mut replayed = Engine::new();
    let report = replayed.replay(&read_history("live_session.jsonl"));
    assert!(report.is_clean());
    assert_eq!(replayed.pending_renders(), 0);

    assert_eq!(live.snapshot(), replayed.snapshot());
    for region in ["contextFooter", "appletPanel"] {
        assert_eq!(
            live.region_html(region).expect("declared"),
            replayed.region_html(region).expect("declared")
        );
    }

    let tags: Vec<_> = replayed
        .snapshot()
        .groups
        .iter()
        .map(|group| group.tag.clone())
        .collect();
    assert_eq!(
        tags,
        vec!["user", "activity", "assistant", "system", "user", "assistant"]
    );
}

#[test]
fn user_toggles_survive_deltas_and_turn_end() {
    let mut engine = Engine::new();
    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"turn_start","data":{}}"#),
            event(r#"{"type":"reasoning_delta","data":{"id":"r1","delta":"hmm"}}"#),
            event(r#"{"type":"tool_start","data":{"id":"t1","name":"ls"}}"#),
            event(r#"{"type":"reasoning_delta","data":{"id":"r2","delta":"left alone"}}"#),
        ],
    );

    let slot_for = |engine: &Engine, key: &str| -> NodeId {
        let doc = engine.document();
        let root = engine.region_root("transcript").expect("transcript");
        doc.children(root)
            .iter()
            .flat_map(|group| doc.children(*group).iter().copied())
            .find(|slot| doc.attr(*slot, "data-key") == Some(key))
            .expect("slot exists")
    };

    let tool = slot_for(&engine, "t1");
    let reasoning = slot_for(&engine, "r1");
    assert!(!engine.toggle_slot(tool).expect("expand tool"));
    assert!(engine.toggle_slot(reasoning).expect("collapse reasoning"));
    assert!(!engine.toggle_slot(reasoning).expect("expand reasoning"));

    deliver_live(
        &mut engine,
        &[
            event(r#"{"type":"tool_output_delta","data":{"id":"t1","delta":"a.txt\n"}}"#),
            event(r#"{"type":"tool_end","data":{"id":"t1","output":"a.txt\n"}}"#),
            event(r#"{"type":"reasoning_delta","data":{"id":"r1","delta":" more"}}"#),
            event(r#"{"type":"turn_end","data":{}}"#),
        ],
    );

    let doc = engine.document();
    assert_eq!(doc.attr(tool, "data-collapsed"), Some("false"));
    assert_eq!(doc.attr(tool, "data-user-toggled"), Some("true"));
    assert_eq!(doc.attr(reasoning, "data-collapsed"), Some("false"));
    let untouched = slot_for(&engine, "r2");
    assert_eq!(doc.attr(untouched, "data-collapsed"), Some("true"));
}
