/// Debug logging utility function
///
/// Prints debug messages with a colored prefix when debug assertions are
/// enabled, or when `REROLL_DEBUG` is set in the environment.
pub fn debug_log(msg: &str) {
    if cfg!(debug_assertions) || std::env::var("REROLL_DEBUG").is_ok() {
        eprintln!("\x1b[1;33m[reroll]\x1b[0m {}", msg);
    }
}
