use crate::output::print_json_line;
use std::io::Read;
use std::path::Path;
use subtrace_core::hook::{self, HookResponse};

/// The process boundary: read the whole payload, dispatch, answer once.
/// Internal failures never produce a non-zero exit.
pub fn run(root: &Path, strict_flag: bool) -> anyhow::Result<()> {
    let config = super::load_config(root);
    let strict = strict_flag || config.strict;
    let coordinator = super::coordinator(root, &config);

    let mut raw = String::new();
    let response = match std::io::stdin().read_to_string(&mut raw) {
        Ok(_) => hook::handle(&raw, &coordinator, strict),
        Err(e) => {
            coordinator.diagnostics().error("hook", format!("stdin unreadable: {e}"));
            if strict {
                HookResponse::block(format!("stdin unreadable: {e}"))
            } else {
                tracing::warn!("stdin unreadable: {e}");
                HookResponse::pass()
            }
        }
    };
    print_json_line(&response)
}
