pub fn render_reset_pin(pin: &str, ttl_minutes: i64) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="font-family: sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
    <h2>Password Reset</h2>
    <p>A password reset was requested for your Reelgate account. Enter this code to choose a new password:</p>
    <p style="font-size: 32px; font-weight: bold; letter-spacing: 6px; font-family: monospace;">{pin}</p>
    <p style="color: #666; font-size: 14px;">This code expires in {ttl_minutes} minutes. If you didn't request this, you can ignore it.</p>
</body>
</html>"#
    )
}
