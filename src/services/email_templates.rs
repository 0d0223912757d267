use crate::models::ActivationPurpose;

pub struct ActivationEmail {
    pub subject: &'static str,
    pub html_body: String,
}

pub fn activation_email(
    purpose: ActivationPurpose,
    email: &str,
    code: &str,
    ttl_minutes: i64,
) -> ActivationEmail {
    match purpose {
        ActivationPurpose::Registration => ActivationEmail {
            subject: "Registration activation code",
            html_body: registration_email(email, code, ttl_minutes),
        },
        ActivationPurpose::ForgetPassword => ActivationEmail {
            subject: "Password reset code",
            html_body: password_reset_email(email, code, ttl_minutes),
        },
    }
}

pub fn registration_email(email: &str, code: &str, ttl_minutes: i64) -> String {
    render(
        "Welcome to Retail Pro!",
        &format!(
            "Use the code below to finish creating the account for <strong>{}</strong>.",
            escape_html(email)
        ),
        code,
        ttl_minutes,
        "If you did not sign up, you can safely ignore this email.",
    )
}

pub fn password_reset_email(email: &str, code: &str, ttl_minutes: i64) -> String {
    render(
        "Reset your password",
        &format!(
            "Use the code below to choose a new password for <strong>{}</strong>.",
            escape_html(email)
        ),
        code,
        ttl_minutes,
        "If you did not request a password reset, you can safely ignore this email.",
    )
}

fn render(heading: &str, intro: &str, code: &str, ttl_minutes: i64, footer: &str) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
</head>
<body style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h1 style="color: #333;">{heading}</h1>
    <p>{intro}</p>
    <p style="text-align: center; margin: 30px 0;">
        <span style="font-size: 28px; letter-spacing: 6px; font-weight: bold; background-color: #f5f5f5; padding: 12px 24px; border-radius: 4px; display: inline-block;">{code}</span>
    </p>
    <p style="color: #999; font-size: 12px; margin-top: 40px;">This code will expire in {ttl_minutes} minutes. {footer}</p>
</body>
</html>
"#,
        heading = heading,
        intro = intro,
        code = escape_html(code),
        ttl_minutes = ttl_minutes,
        footer = footer,
    )
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
