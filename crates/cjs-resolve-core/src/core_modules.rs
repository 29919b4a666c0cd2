//! Node.js built-in module names.

/// Built-ins reachable both bare and with the `node:` scheme.
const BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "inspector/promises",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Built-ins that only exist behind the `node:` scheme.
const SCHEME_ONLY_BUILTINS: &[&str] = &["sea", "sqlite", "test", "test/reporters"];

/// Whether `specifier` names a Node.js built-in module.
#[must_use]
pub fn is_core_module(specifier: &str) -> bool {
    match specifier.strip_prefix("node:") {
        Some(name) => BUILTINS.contains(&name) || SCHEME_ONLY_BUILTINS.contains(&name),
        None => BUILTINS.contains(&specifier),
    }
}
