use crate::dom::Element;

/// Wraps a page body in the shared document shell
pub fn document(title: &str, body: &Element, script: Option<&str>) -> String {
    let script = script
        .map(|s| format!("<script>{}</script>", s))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
<link rel="stylesheet" href="/static/styles.css">
</head>
<body class="bg-gray-100">
<header class="brand-header"><a href="/" class="brand-text">Agent Suite</a></header>
<main class="container">
{body}
</main>
{script}
</body>
</html>
"#,
        title = crate::markup::escape_html(title),
        body = body.to_html(),
        script = script,
    )
}

/// Browser side of the chat socket: forwards submit/clear and swaps in the
/// transcript the server sends back.
pub const CHAT_SCRIPT: &str = r#"
(() => {
  const chatWindow = document.getElementById('chat-window');
  const form = document.getElementById('chat-form');
  const input = document.getElementById('message-input');
  const clear = document.getElementById('clear-chat');
  const proto = location.protocol === 'https:' ? 'wss' : 'ws';
  const socket = new WebSocket(`${proto}://${location.host}/jobplacement/ws`);
  socket.onmessage = (event) => {
    const msg = JSON.parse(event.data);
    if (msg.type === 'transcript') {
      chatWindow.innerHTML = msg.html;
      chatWindow.scrollTop = chatWindow.scrollHeight;
    }
  };
  form.addEventListener('submit', (e) => {
    e.preventDefault();
    socket.send(JSON.stringify({ type: 'chat-submit', text: input.value }));
    input.value = '';
  });
  clear.addEventListener('click', () => socket.send(JSON.stringify({ type: 'chat-clear' })));
})();
"#;
