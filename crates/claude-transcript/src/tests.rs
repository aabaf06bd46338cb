/// Parsing tests for transcript lines using representative records captured
/// from Claude session logs.
#[cfg(test)]
mod unit {
    use crate::types::{TranscriptEvent, TranscriptRecord};
    use crate::TranscriptError;

    #[test]
    fn parse_assistant_with_text_and_tool_use() {
        let line = r#"{"type":"assistant","sessionId":"sess-1","uuid":"u-1","isSidechain":true,"message":{"role":"assistant","content":[{"type":"text","text":"Writing the route."},{"type":"tool_use","id":"toolu_01","name":"Write","input":{"file_path":"/src/routes.ts","content":"export {}"}}]}}"#;
        let events = TranscriptEvent::from_line(line);
        assert_eq!(events.len(), 2);
        assert_eq!(
            events[0],
            TranscriptEvent::AssistantMessage {
                text: "Writing the route.".into()
            }
        );
        let TranscriptEvent::ToolInvocation {
            tool_name,
            tool_use_id,
            ..
        } = &events[1]
        else {
            panic!("expected ToolInvocation")
        };
        assert_eq!(tool_name, "Write");
        assert_eq!(tool_use_id, "toolu_01");
        assert_eq!(events[1].argument("file_path"), Some("/src/routes.ts"));
    }

    #[test]
    fn parse_user_tool_result() {
        let line = r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"toolu_01","content":"File created","is_error":false}]}}"#;
        let events = TranscriptEvent::from_line(line);
        assert_eq!(
            events,
            vec![TranscriptEvent::ToolResult {
                tool_use_id: "toolu_01".into(),
                payload: serde_json::json!("File created"),
                is_error: false,
            }]
        );
    }

    #[test]
    fn tool_result_with_block_content() {
        let line = r#"{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t","content":[{"type":"text","text":"ok"}],"is_error":true}]}}"#;
        let events = TranscriptEvent::from_line(line);
        let TranscriptEvent::ToolResult {
            payload, is_error, ..
        } = &events[0]
        else {
            panic!("expected ToolResult")
        };
        assert!(is_error);
        assert!(payload.is_array());
    }

    #[test]
    fn user_prompt_text_yields_no_events() {
        let line = r#"{"type":"user","message":{"role":"user","content":"find the endpoints"}}"#;
        assert!(TranscriptEvent::from_line(line).is_empty());
    }

    #[test]
    fn assistant_string_content_is_a_message() {
        let line = r#"{"type":"assistant","message":{"content":"done"}}"#;
        assert_eq!(
            TranscriptEvent::from_line(line),
            vec![TranscriptEvent::AssistantMessage {
                text: "done".into()
            }]
        );
    }

    #[test]
    fn thinking_and_unknown_blocks_are_dropped() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"thinking","thinking":"hmm","signature":"x"},{"type":"image","source":{}}]}}"#;
        assert!(TranscriptEvent::from_line(line).is_empty());
    }

    #[test]
    fn unknown_record_type_is_unparsed() {
        let line = r#"{"type":"summary","summary":"Refactor","leafUuid":"abc"}"#;
        assert!(matches!(
            TranscriptRecord::parse(line),
            Err(TranscriptError::UnknownRecord(kind)) if kind == "summary"
        ));
        let events = TranscriptEvent::from_line(line);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_unparsed());
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(
            TranscriptRecord::parse("{\"type\": \"assistant\""),
            Err(TranscriptError::Parse { .. })
        ));
    }

    #[test]
    fn tool_use_without_input_defaults_to_null() {
        let line = r#"{"type":"assistant","message":{"content":[{"type":"tool_use","id":"t","name":"TodoRead"}]}}"#;
        let events = TranscriptEvent::from_line(line);
        assert_eq!(events[0].tool_name(), Some("TodoRead"));
        assert_eq!(events[0].argument("file_path"), None);
    }
}
