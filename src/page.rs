//! Single-page upload UI

/// Upload page: file picker, preview table, results table, download button.
pub const INDEX_HTML: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Restaurant Analysis &amp; Prediction</title>
<style>
  body { font-family: sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }
  table { border-collapse: collapse; margin: 1rem 0; font-size: 0.9rem; }
  th, td { border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }
  th { background: #f4f4f4; }
  .error { color: #b00020; }
  .hidden { display: none; }
</style>
</head>
<body>
<h1>Restaurant Analysis &amp; Prediction</h1>
<p>Upload your dataset to predict <strong>Online Order Availability &amp; Estimated Cost for Two</strong>.</p>

<input type="file" id="file" accept=".csv,text/csv">
<p id="error" class="error"></p>

<section id="preview-section" class="hidden">
  <h3>Uploaded Data Preview</h3>
  <div id="preview"></div>
</section>

<section id="results-section" class="hidden">
  <h3>Predictions</h3>
  <div id="results"></div>
  <button id="download">Download Predictions CSV</button>
</section>

<script>
const fileInput = document.getElementById("file");
const errorBox = document.getElementById("error");
let lastReport = null;

function renderTable(headers, rows) {
  const table = document.createElement("table");
  const head = table.createTHead().insertRow();
  headers.forEach(h => { const th = document.createElement("th"); th.textContent = h; head.appendChild(th); });
  const body = table.createTBody();
  rows.forEach(r => { const tr = body.insertRow(); r.forEach(c => { tr.insertCell().textContent = c; }); });
  return table;
}

function show(id, node) {
  const target = document.getElementById(id);
  target.replaceChildren(node);
  document.getElementById(id + "-section").classList.remove("hidden");
}

fileInput.addEventListener("change", async () => {
  errorBox.textContent = "";
  document.getElementById("preview-section").classList.add("hidden");
  document.getElementById("results-section").classList.add("hidden");
  if (!fileInput.files.length) return;

  const form = new FormData();
  form.append("file", fileInput.files[0]);
  const response = await fetch("/api/predict", { method: "POST", body: form });
  const payload = await response.json();
  if (payload.preview) {
    show("preview", renderTable(payload.preview.headers, payload.preview.rows));
  }
  if (!response.ok) {
    errorBox.textContent = payload.missing_columns
      ? "Missing required columns: " + payload.missing_columns.join(", ")
      : payload.error;
    return;
  }

  lastReport = payload;
  show("results", renderTable(
    ["name", "Predicted_Online_Order", "Predicted_Cost"],
    payload.results.map(r => [r.name, r.Predicted_Online_Order, r.Predicted_Cost])
  ));
});

document.getElementById("download").addEventListener("click", () => {
  if (!lastReport) return;
  const blob = new Blob([lastReport.csv], { type: "text/csv" });
  const link = document.createElement("a");
  link.href = URL.createObjectURL(blob);
  link.download = lastReport.file_name;
  link.click();
  URL.revokeObjectURL(link.href);
});
</script>
</body>
</html>
"#;
