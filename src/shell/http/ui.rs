//! Chat page served at `/`.
//!
//! One static page drives everything through the JSON API. The configured
//! [`Theme`] picks the colour palette; `__THEME__` and `__APP_NAME__` are
//! substituted at request time.

use axum::{extract::State, response::Html};

use crate::config::Theme;

use super::HttpState;

const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en" data-theme="__THEME__">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1" />
  <title>__APP_NAME__</title>
  <style>
    :root[data-theme="light"] {
      --bg: #f5f7f9; --panel: #ffffff; --text: #1a202c; --muted: #666;
      --user-bg: #e6f3ff; --user-edge: #2b6cb0;
      --bot-bg: #f0f0f0; --bot-edge: #718096; --border: #e0e0e0;
    }
    :root[data-theme="dark"] {
      --bg: #0f1115; --panel: #1a1d23; --text: #e0e0e0; --muted: #888;
      --user-bg: #1e2a3a; --user-edge: #4a90d9;
      --bot-bg: #23262d; --bot-edge: #718096; --border: #333;
    }
    *, *::before, *::after { box-sizing: border-box; margin: 0; padding: 0; }
    body {
      font-family: system-ui, -apple-system, sans-serif;
      background: var(--bg); color: var(--text);
      display: flex; height: 100vh;
    }
    aside {
      width: 280px; padding: 1.25rem; background: var(--panel);
      border-right: 1px solid var(--border); overflow-y: auto;
    }
    aside h2 { font-size: 1.1rem; margin-bottom: 1rem; }
    aside label { display: block; font-size: 0.85rem; margin: 0.9rem 0 0.3rem; }
    aside select, aside input { width: 100%; }
    .model-info {
      margin-top: 0.8rem; padding: 0.6rem; border-radius: 10px;
      background: var(--user-edge); color: #fff; font-size: 0.8rem;
    }
    button {
      margin-top: 1.2rem; width: 100%; padding: 0.5rem; border-radius: 15px;
      border: 1px solid var(--border); background: var(--bot-bg); color: var(--text);
      cursor: pointer; font-weight: 500;
    }
    main { flex: 1; display: flex; flex-direction: column; padding: 1.5rem; }
    #log { flex: 1; overflow-y: auto; }
    .msg { padding: 15px; border-radius: 15px; margin-bottom: 10px; white-space: pre-wrap; }
    .msg.user { background: var(--user-bg); border-left: 5px solid var(--user-edge); }
    .msg.assistant { background: var(--bot-bg); border-left: 5px solid var(--bot-edge); }
    .meta { font-size: 0.75rem; color: var(--muted); margin: -4px 0 10px 6px; }
    form { display: flex; gap: 0.5rem; margin-top: 1rem; }
    form input {
      flex: 1; padding: 12px 15px; border-radius: 15px;
      border: 1px solid var(--border); background: var(--panel); color: var(--text);
    }
    form button { width: auto; margin: 0; padding: 0 1.2rem; }
    footer { text-align: center; font-size: 12px; color: var(--muted); padding-top: 0.8rem; }
  </style>
</head>
<body>
  <aside>
    <h2>Settings</h2>
    <label for="model">Model</label>
    <select id="model"></select>
    <div class="model-info" id="model-info"></div>
    <label for="temperature">Temperature <span id="t-val"></span></label>
    <input id="temperature" type="range" min="0" max="1" step="0.1" />
    <label for="max-tokens">Max tokens <span id="m-val"></span></label>
    <input id="max-tokens" type="range" min="50" max="1000" step="50" />
    <label for="persona">Prompt style</label>
    <select id="persona"></select>
    <button id="clear">Clear chat</button>
  </aside>
  <main>
    <div id="log"></div>
    <form id="ask">
      <input id="question" autocomplete="off" placeholder="Type your question here..." />
      <button type="submit">Send</button>
    </form>
    <footer>Conversation ID: <span id="session"></span></footer>
  </main>
  <script>
    const $ = (id) => document.getElementById(id);
    let models = [];

    async function api(path, opts) {
      const res = await fetch(path, Object.assign({ headers: { "content-type": "application/json" } }, opts));
      return [res.status, await res.json()];
    }

    function bubble(role, text) {
      const div = document.createElement("div");
      div.className = "msg " + role;
      div.textContent = text;
      $("log").appendChild(div);
      $("log").scrollTop = $("log").scrollHeight;
    }

    function showSettings(s) {
      $("model").value = s.model;
      $("persona").value = s.persona;
      $("temperature").value = s.temperature;
      $("max-tokens").value = s.max_tokens;
      $("t-val").textContent = s.temperature;
      $("m-val").textContent = s.max_tokens;
      const m = models.find((m) => m.id === s.model);
      $("model-info").innerHTML = "";
      if (m) {
        const b = document.createElement("strong");
        b.textContent = m.id.toUpperCase();
        $("model-info").append(b, document.createElement("br"), m.description);
      }
    }

    async function patch(body) {
      const [status, data] = await api("/api/settings", { method: "PUT", body: JSON.stringify(body) });
      if (status === 200) showSettings(data); else alert(data.message);
    }

    async function load() {
      models = (await api("/api/models"))[1].models;
      for (const m of models) $("model").add(new Option(m.id, m.id));
      for (const p of (await api("/api/personas"))[1].personas) $("persona").add(new Option(p.name, p.name));
      const [, conv] = await api("/api/conversation");
      $("session").textContent = conv.session_id;
      $("log").innerHTML = "";
      for (const t of conv.turns) bubble(t.role, t.content);
      showSettings(conv.settings);
    }

    $("model").onchange = (e) => patch({ model: e.target.value });
    $("persona").onchange = (e) => patch({ persona: e.target.value });
    $("temperature").onchange = (e) => patch({ temperature: parseFloat(e.target.value) });
    $("max-tokens").onchange = (e) => patch({ max_tokens: parseInt(e.target.value, 10) });

    $("clear").onclick = async () => {
      const [, data] = await api("/api/clear", { method: "POST" });
      $("log").innerHTML = "";
      $("session").textContent = data.session_id;
    };

    $("ask").onsubmit = async (e) => {
      e.preventDefault();
      const q = $("question").value;
      if (!q.trim()) return;
      $("question").value = "";
      bubble("user", q);
      const [status, data] = await api("/api/message", { method: "POST", body: JSON.stringify({ message: q }) });
      if (status !== 200) { bubble("assistant", data.message); return; }
      bubble("assistant", data.reply);
      if (!data.failed) {
        const meta = document.createElement("div");
        meta.className = "meta";
        meta.textContent = "Response generated in " + data.elapsed_seconds + " seconds";
        $("log").appendChild(meta);
      }
      $("session").textContent = data.session_id;
    };

    load();
  </script>
</body>
</html>
"#;

/// GET /: chat page.
pub(super) async fn root(State(state): State<HttpState>) -> Html<String> {
    Html(render(state.theme, &state.app_name))
}

pub(super) fn render(theme: Theme, app_name: &str) -> String {
    let theme = match theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    INDEX_HTML
        .replace("__THEME__", theme)
        .replace("__APP_NAME__", &escape_html(app_name))
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
