//! Embedded HTML/CSS/JS frontend for the credit dashboard.
//!
//! The entire SPA is compiled into the binary as a string constant.
//! No external assets, no build tools, no CDN dependencies.

/// The complete single-page dashboard HTML.
pub const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Prêt à dépenser - Credit Granting Dashboard</title>
<style>
:root {
  --bg: #ffffff;
  --sidebar: #f0f2f6;
  --border: #d0d4dc;
  --text: #262730;
  --text-muted: #4a4d57;
  --accent: #0b5cad;
  --green-bg: #dff3e4;
  --green: #0f5b26;
  --red-bg: #fde2e1;
  --red: #8a1c1c;
  --radius: 8px;
  --font: "Source Sans Pro", -apple-system, BlinkMacSystemFont, 'Segoe UI', Helvetica, Arial, sans-serif;
}

* { margin: 0; padding: 0; box-sizing: border-box; }
body {
  background: var(--bg);
  color: var(--text);
  font-family: var(--font);
  font-size: 16px;
  line-height: 1.5;
}

/* Layout */
.app {
  display: flex;
  min-height: 100vh;
}

aside {
  width: 300px;
  flex-shrink: 0;
  background: var(--sidebar);
  border-right: 1px solid var(--border);
  padding: 24px 20px;
}

aside h2 {
  font-size: 18px;
  margin-bottom: 12px;
}

main {
  flex: 1;
  padding: 32px 48px;
  max-width: 1100px;
}

main h1 {
  font-size: 30px;
  font-weight: 700;
  margin-bottom: 16px;
}

label {
  display: block;
  font-weight: 600;
  margin: 16px 0 6px;
}

input[type=text], select {
  width: 100%;
  padding: 8px 10px;
  border: 1px solid var(--border);
  border-radius: var(--radius);
  font: inherit;
  color: var(--text);
  background: #fff;
}

input[type=text]:focus, select:focus {
  outline: 3px solid var(--accent);
  outline-offset: 1px;
}

select[multiple] { min-height: 160px; }

.hint {
  font-size: 14px;
  color: var(--text-muted);
  margin-top: 4px;
}

.controls { display: none; }
.controls.active { display: block; }

/* View */
hr { border: none; border-top: 1px solid var(--border); margin: 16px 0; }
.view h2 { font-size: 24px; margin: 16px 0 8px; }
.view h3 { font-size: 20px; margin: 16px 0 8px; }
.view .message { margin: 12px 0; }

.alert {
  padding: 12px 16px;
  border-radius: var(--radius);
  margin: 8px 0;
  font-weight: 600;
}
.alert.success { background: var(--green-bg); color: var(--green); }
.alert.error { background: var(--red-bg); color: var(--red); }

figure.chart { margin: 16px 0; }
figure.chart svg { max-width: 100%; height: auto; }

.custom-caption {
  font-size: 14px;
  color: var(--text-muted);
  text-align: center;
  margin-top: 4px;
}

.st-table {
  border-collapse: collapse;
  min-width: 400px;
  margin: 8px 0;
}
.st-table th, .st-table td {
  border: 1px solid var(--border);
  padding: 4px 10px;
  text-align: left;
}
.st-table thead th { background: var(--sidebar); }
.st-table tbody th { font-weight: 600; }

.loading { color: var(--text-muted); }
</style>
</head>
<body>
<div class="app">
  <aside>
    <h2>Navigation</h2>
    <label for="section">Go to</label>
    <select id="section"></select>

    <div id="descriptive-controls" class="controls">
      <label for="features">Features to compare</label>
      <select id="features" multiple></select>
      <p class="hint">Hold Ctrl or Cmd to select several features.</p>
    </div>

    <div id="bivariate-controls" class="controls">
      <label for="feature-x">Feature on the x axis</label>
      <select id="feature-x"></select>
      <label for="feature-y">Feature on the y axis</label>
      <select id="feature-y"></select>
    </div>
  </aside>

  <main>
    <h1>Prêt à dépenser - Credit Granting Dashboard</h1>
    <label for="client-id">Client ID</label>
    <input id="client-id" type="text" maxlength="6" inputmode="numeric" autocomplete="off"
           placeholder="e.g. 100002" aria-describedby="client-id-hint">
    <p id="client-id-hint" class="hint">Enter the 6-digit client identifier.</p>
    <div id="view" aria-live="polite"></div>
  </main>
</div>

<script>
// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------
let features = [];
let renderSeq = 0;

// ---------------------------------------------------------------------------
// API helpers
// ---------------------------------------------------------------------------
async function api(path) {
  const res = await fetch(path);
  return res.json();
}

function option(value, label) {
  const el = document.createElement('option');
  el.value = value;
  el.textContent = label;
  return el;
}

function selectedFeatures() {
  return Array.from(document.getElementById('features').selectedOptions).map(o => o.value);
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------
function showControls(section) {
  document.getElementById('descriptive-controls')
    .classList.toggle('active', section === 'descriptive');
  document.getElementById('bivariate-controls')
    .classList.toggle('active', section === 'bivariate');
}

async function loadControls() {
  const data = await api('/api/features');
  features = data.features;

  const section = document.getElementById('section');
  for (const s of data.sections) section.appendChild(option(s.slug, s.title));

  for (const id of ['features', 'feature-x', 'feature-y']) {
    const el = document.getElementById(id);
    for (const f of features) el.appendChild(option(f, f));
  }
  showControls(section.value);
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------
async function render() {
  const view = document.getElementById('view');
  const clientId = document.getElementById('client-id').value.trim();
  const section = document.getElementById('section').value;
  showControls(section);

  // Every interaction starts from an empty view.
  view.innerHTML = '';
  const seq = ++renderSeq;
  if (clientId.length !== 6) return;

  const params = new URLSearchParams({ client_id: clientId, section });
  if (section === 'descriptive') {
    params.set('features', selectedFeatures().join(','));
  }
  if (section === 'bivariate') {
    params.set('x', document.getElementById('feature-x').value);
    params.set('y', document.getElementById('feature-y').value);
  }

  view.innerHTML = '<p class="loading">Loading…</p>';
  try {
    const data = await api('/api/render?' + params.toString());
    if (seq !== renderSeq) return;
    view.innerHTML = data.html !== undefined ? data.html : '<p class="message">' + esc(data.error) + '</p>';
  } catch (e) {
    if (seq !== renderSeq) return;
    view.innerHTML = '<p class="message">' + esc(String(e)) + '</p>';
  }
}

function esc(s) {
  const d = document.createElement('div');
  d.textContent = s === undefined ? '' : s;
  return d.innerHTML;
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------
document.getElementById('client-id').addEventListener('input', render);
for (const id of ['section', 'features', 'feature-x', 'feature-y']) {
  document.getElementById(id).addEventListener('change', render);
}

loadControls().then(render);
</script>
</body>
</html>
"##;
