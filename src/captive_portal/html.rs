//! Embedded HTML pages

use crate::config::{FAILED_REDIRECT_MS, SESSION_DURATION_MS};

pub const LOGIN_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Login</title>
    <style>
        body { font-family: Arial, sans-serif; text-align: center; margin-top: 20%; }
        .container { max-width: 300px; margin: auto; }
        input { padding: 10px; margin: 10px; width: 100%; box-sizing: border-box; }
        input[type="submit"] { background-color: #000; color: #fff; border: none; cursor: pointer; }
    </style>
</head>
<body>
    <div class="container">
        <h1>Login</h1>
        <form action="/authenticate" method="POST">
            <input type="password" name="password" placeholder="Password" required>
            <input type="submit" value="Authenticate">
        </form>
    </div>
</body>
</html>"#;

/// Success page; sends the browser back to `/` once the session is over.
pub fn success_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Success</title>
    <script>
        setTimeout(function() {{ location.href = "/"; }}, {redirect_ms});
    </script>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; margin-top: 20%; color: #333; }}
        h1 {{ font-size: 2em; }}
        button {{ padding: 10px 20px; background-color: #000; color: #fff; border: none; cursor: pointer; }}
    </style>
</head>
<body>
    <h1>Authentication Successful!</h1>
    <p>LED is ON for {seconds} seconds.</p>
    <form action="/logout" method="POST">
        <button type="submit">Log out</button>
    </form>
</body>
</html>"#,
        redirect_ms = SESSION_DURATION_MS,
        seconds = SESSION_DURATION_MS / 1000,
    )
}

pub fn failed_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Failed</title>
    <script>
        setTimeout(function() {{ location.href = "/"; }}, {redirect_ms});
    </script>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; margin-top: 20%; color: #721c24; background-color: #f8d7da; }}
        h1 {{ font-size: 2em; }}
    </style>
</head>
<body>
    <h1>Authentication Failed</h1>
    <p>Incorrect password. Returning to login...</p>
</body>
</html>"#,
        redirect_ms = FAILED_REDIRECT_MS,
    )
}
