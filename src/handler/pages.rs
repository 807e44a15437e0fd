//! Landing page assets
//!
//! The browser UI is a single HTML page plus one script, both embedded in the
//! binary so the server needs nothing on disk besides the served root.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;

use crate::http;

pub fn serve_index(is_head: bool) -> Response<Full<Bytes>> {
    http::build_text_response(INDEX_HTML, "text/html; charset=utf-8", is_head)
}

pub fn serve_script(is_head: bool) -> Response<Full<Bytes>> {
    http::build_text_response(SCRIPT_JS, "application/javascript", is_head)
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>dirshare</title>
    <style>
        * { margin: 0; padding: 0; box-sizing: border-box; }
        body {
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, "Helvetica Neue", Arial, sans-serif;
            background: #f4f5f7;
            color: #1f2933;
            padding: 32px 16px;
        }
        .container { max-width: 860px; margin: 0 auto; }
        h1 { font-size: 1.6em; margin-bottom: 16px; }
        .panel {
            background: white;
            border-radius: 10px;
            box-shadow: 0 2px 10px rgba(15, 23, 42, 0.08);
            padding: 20px;
            margin-bottom: 20px;
        }
        #drop-zone {
            border: 2px dashed #9aa5b1;
            border-radius: 8px;
            padding: 28px;
            text-align: center;
            cursor: pointer;
            color: #52606d;
        }
        #drop-zone.dragover { border-color: #3b82f6; background: #eff6ff; }
        #selected { margin-top: 12px; font-size: 0.9em; color: #52606d; }
        button {
            margin-top: 12px;
            padding: 8px 18px;
            border: none;
            border-radius: 6px;
            background: #3b82f6;
            color: white;
            cursor: pointer;
        }
        button:disabled { background: #9aa5b1; cursor: default; }
        #status { margin-top: 10px; font-size: 0.9em; }
        #status.error { color: #dc2626; }
        #breadcrumbs { margin-bottom: 12px; font-size: 0.95em; }
        .crumb { color: #3b82f6; cursor: pointer; }
        .crumb:hover { text-decoration: underline; }
        #file-list { list-style: none; }
        #file-list li {
            display: flex;
            justify-content: space-between;
            padding: 10px 8px;
            border-bottom: 1px solid #e4e7eb;
            cursor: pointer;
        }
        #file-list li:hover { background: #f8fafc; }
        #file-list li.empty { color: #9aa5b1; cursor: default; justify-content: center; }
        .meta { color: #7b8794; font-size: 0.85em; }
    </style>
</head>
<body>
    <div class="container">
        <h1>dirshare</h1>

        <div class="panel">
            <div id="drop-zone">Drop files here or click to choose</div>
            <input type="file" id="file-input" multiple hidden>
            <div id="selected"></div>
            <button id="upload-btn" disabled>Upload</button>
            <div id="status"></div>
        </div>

        <div class="panel">
            <div id="breadcrumbs"></div>
            <ul id="file-list"></ul>
        </div>
    </div>
    <script src="/static/script.js"></script>
</body>
</html>"#;

const SCRIPT_JS: &str = r#"(() => {
    const dropZone = document.getElementById('drop-zone');
    const fileInput = document.getElementById('file-input');
    const uploadBtn = document.getElementById('upload-btn');
    const selected = document.getElementById('selected');
    const statusLine = document.getElementById('status');
    const breadcrumbs = document.getElementById('breadcrumbs');
    const fileList = document.getElementById('file-list');

    let currentPath = '';
    let queue = [];

    const formatSize = (bytes) => {
        if (!bytes) return '0 B';
        const units = ['B', 'KB', 'MB', 'GB', 'TB'];
        const i = Math.min(Math.floor(Math.log(bytes) / Math.log(1024)), units.length - 1);
        return `${parseFloat((bytes / Math.pow(1024, i)).toFixed(2))} ${units[i]}`;
    };

    const setStatus = (text, isError) => {
        statusLine.textContent = text;
        statusLine.className = isError ? 'error' : '';
    };

    const renderQueue = () => {
        selected.textContent = queue.map((f) => `${f.name} (${formatSize(f.size)})`).join(', ');
        uploadBtn.disabled = queue.length === 0;
        uploadBtn.textContent = queue.length > 1 ? `Upload ${queue.length} files` : 'Upload';
    };

    const enqueue = (files) => {
        for (const file of files) {
            if (!queue.some((f) => f.name === file.name)) queue.push(file);
        }
        renderQueue();
    };

    const renderBreadcrumbs = (path) => {
        breadcrumbs.replaceChildren();
        const home = document.createElement('span');
        home.className = 'crumb';
        home.textContent = 'Home';
        home.onclick = () => load('');
        breadcrumbs.appendChild(home);

        let built = '';
        for (const part of path.split('/').filter((p) => p && p !== '.')) {
            built = built ? `${built}/${part}` : part;
            // A top-level folder named "root" must not be sent as the bare sentinel
            const target = built === 'root' ? './root' : built;
            breadcrumbs.appendChild(document.createTextNode(' / '));
            const crumb = document.createElement('span');
            crumb.className = 'crumb';
            crumb.textContent = part;
            crumb.onclick = () => load(target);
            breadcrumbs.appendChild(crumb);
        }
    };

    const renderFiles = (files) => {
        fileList.replaceChildren();
        if (files.length === 0) {
            const li = document.createElement('li');
            li.className = 'empty';
            li.textContent = 'Empty directory';
            fileList.appendChild(li);
            return;
        }

        files.sort((a, b) => (a.is_dir === b.is_dir ? a.name.localeCompare(b.name) : a.is_dir ? -1 : 1));

        for (const file of files) {
            const li = document.createElement('li');
            const name = document.createElement('span');
            name.textContent = file.is_dir ? `[dir] ${file.name}` : file.name;
            const meta = document.createElement('span');
            meta.className = 'meta';
            meta.textContent = file.is_dir ? 'Folder' : formatSize(file.size);
            li.append(name, meta);
            li.onclick = file.is_dir
                ? () => load(file.path)
                : () => { window.location.href = `/api/download?path=${encodeURIComponent(file.path)}`; };
            fileList.appendChild(li);
        }
    };

    const load = (path) => {
        fetch(`/api/files?path=${encodeURIComponent(path)}`)
            .then((res) => res.json())
            .then((data) => {
                if (data.error) {
                    setStatus(data.error, true);
                    return;
                }
                currentPath = data.current_path;
                renderBreadcrumbs(currentPath);
                renderFiles(data.files);
            })
            .catch((err) => setStatus(String(err), true));
    };

    const upload = () => {
        const form = new FormData();
        queue.forEach((file) => form.append('file', file));
        uploadBtn.disabled = true;

        const xhr = new XMLHttpRequest();
        xhr.open('POST', '/api/upload', true);
        xhr.upload.onprogress = (e) => {
            if (e.lengthComputable) setStatus(`Uploading... ${Math.round((e.loaded / e.total) * 100)}%`);
        };
        xhr.onload = () => {
            let body = {};
            try { body = JSON.parse(xhr.responseText); } catch (_) { /* non-JSON error page */ }
            if (xhr.status === 200) {
                setStatus(`Uploaded ${body.filenames.join(', ')}`);
                queue = [];
                renderQueue();
                load(currentPath);
            } else {
                setStatus(body.error || 'Upload failed', true);
                uploadBtn.disabled = false;
            }
        };
        xhr.onerror = () => {
            setStatus('Upload failed', true);
            uploadBtn.disabled = false;
        };
        xhr.send(form);
    };

    dropZone.addEventListener('click', () => fileInput.click());
    dropZone.addEventListener('dragover', (e) => {
        e.preventDefault();
        dropZone.classList.add('dragover');
    });
    dropZone.addEventListener('dragleave', () => dropZone.classList.remove('dragover'));
    dropZone.addEventListener('drop', (e) => {
        e.preventDefault();
        dropZone.classList.remove('dragover');
        enqueue(e.dataTransfer.files);
    });
    fileInput.addEventListener('change', () => {
        enqueue(fileInput.files);
        fileInput.value = '';
    });
    uploadBtn.addEventListener('click', upload);

    load('');
})();
"#;
