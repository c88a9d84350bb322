//! Text and HTML rendering of a [`Snapshot`].
//!
//! Plain `format!` templates with inline CSS; no template engine.

use std::fmt::Write;

use crate::check::TimestampedResult;
use crate::status::Snapshot;
use crate::store::PeerState;

/// HTML-escape a string.
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Body of `/healthz`. The verbose form lists each local check, then one
/// line per configured peer, before the final `ok`/`unhealthy` line.
pub fn healthz(snapshot: &Snapshot, verbose: bool) -> String {
    let mut body = String::new();
    if verbose {
        for result in snapshot.local() {
            if result.is_success() {
                let _ = writeln!(body, "[+]{} ok", result.name());
            } else {
                let _ = writeln!(body, "[-]{} failed", result.name());
            }
        }
        for (addr, ok) in snapshot.peer_ok().iter() {
            if *ok {
                let _ = writeln!(body, "[+]peer:{} ok", addr);
            } else {
                let _ = writeln!(body, "[-]peer:{} failed", addr);
            }
        }
    }

    body.push_str(if snapshot.global_ok() {
        "ok\n"
    } else {
        "unhealthy\n"
    });
    body
}

fn status_badge(ok: bool) -> &'static str {
    if ok {
        r#"<span class="badge ok">healthy</span>"#
    } else {
        r#"<span class="badge fail">unhealthy</span>"#
    }
}

fn results_table(results: &[TimestampedResult]) -> String {
    if results.is_empty() {
        return r#"<p class="empty">No results.</p>"#.to_string();
    }

    let mut rows = String::new();
    for r in results {
        let class = if r.is_success() { "ok" } else { "fail" };
        let _ = write!(
            rows,
            r#"<tr>
  <td>{name}</td>
  <td class="{class}">{exit_code}</td>
  <td><pre>{stdout}</pre></td>
  <td><pre>{stderr}</pre></td>
  <td>{last_run}</td>
</tr>
"#,
            name = html_escape(r.name()),
            exit_code = r.result.exit_code,
            stdout = html_escape(&r.result.stdout),
            stderr = html_escape(&r.result.stderr),
            last_run = r.last_run.format("%Y-%m-%d %H:%M:%S UTC"),
        );
    }

    format!(
        r#"<table>
<thead><tr>
  <th>Script</th><th>Exit Code</th><th>Output</th><th>Error</th><th>Last Run</th>
</tr></thead>
<tbody>
{rows}</tbody>
</table>"#
    )
}

fn peer_section(addr: &str, state: &PeerState) -> String {
    let mut section = format!(
        "<section>\n<h2>{} {}</h2>\n",
        html_escape(addr),
        status_badge(state.is_ok())
    );

    if state.is_pending() {
        section.push_str(r#"<p class="empty">Waiting for first fetch.</p>"#);
        section.push_str("\n</section>\n");
        return section;
    }

    if let Some(err) = state.error() {
        let _ = writeln!(
            section,
            r#"<p class="error">Last fetch failed: {}</p>"#,
            html_escape(&err.to_string())
        );
        if let Some(at) = state.fetched_at() {
            let _ = writeln!(
                section,
                r#"<p class="stale">Showing results from {}</p>"#,
                at.format("%Y-%m-%d %H:%M:%S UTC")
            );
        }
    }

    section.push_str(&results_table(state.results()));
    section.push_str("\n</section>\n");
    section
}

/// The HTML dashboard.
pub fn index(snapshot: &Snapshot) -> String {
    let mut peers = String::new();
    for (addr, state) in snapshot.peers() {
        peers.push_str(&peer_section(addr, state));
    }
    if !peers.is_empty() {
        peers.insert_str(0, "<h1>Peers</h1>\n");
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>checkmesh</title>
<style>
body {{ font-family: monospace; margin: 24px; }}
table {{ border-collapse: collapse; width: 100%; margin-bottom: 16px; }}
th, td {{ border: 1px solid black; padding: 8px; text-align: left; vertical-align: top; }}
pre {{ margin: 0; white-space: pre-wrap; }}
td.ok {{ background-color: #3fb950; }}
td.fail {{ background-color: #f85149; }}
.badge {{ font-size: 12px; padding: 2px 8px; border-radius: 12px; }}
.badge.ok {{ background: #3fb950; }}
.badge.fail {{ background: #f85149; }}
.error {{ color: #b62324; }}
.stale, .empty {{ color: #57606a; }}
</style>
</head>
<body>
<h1>checkmesh {global}</h1>
<p>local {local} &middot; remote {remote}</p>
<h1>Local checks</h1>
{local_table}
{peers}</body>
</html>
"#,
        global = status_badge(snapshot.global_ok()),
        local = status_badge(snapshot.local_ok()),
        remote = status_badge(snapshot.remote_ok()),
        local_table = results_table(snapshot.local()),
        peers = peers,
    )
}
