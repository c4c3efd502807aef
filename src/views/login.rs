//! Login form.

use super::{escape, layout};

/// A one-line message shown above the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice<'a> {
    Error(&'a str),
    Info(&'a str),
}

pub fn login_page(notice: Option<Notice<'_>>, username: &str) -> String {
    let notice = match notice {
        Some(Notice::Error(msg)) => format!(r#"<p class="notice-error">{}</p>"#, escape(msg)),
        Some(Notice::Info(msg)) => format!(r#"<p class="notice-info">{}</p>"#, escape(msg)),
        None => String::new(),
    };

    let body = format!(
        r#"<h1>Sign in</h1>
{notice}
<form method="post" action="/login">
<p><label>Username <input name="username" value="{username}" autocomplete="username" required></label></p>
<p><label>Password <input name="password" type="password" autocomplete="current-password" required></label></p>
<p><button type="submit">Log in</button></p>
</form>"#,
        notice = notice,
        username = escape(username),
    );
    layout("Sign in", &body)
}
