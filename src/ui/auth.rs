//! Login and registration pages.

use super::forms::FormErrors;
use super::layout::{PageContext, html_shell, html_shell_with_head};
use super::escape;
use crate::i18n::Locale;

/// Seconds the registration success notice stays up before going to login.
const REGISTER_REDIRECT_SECS: u32 = 3;

/// State of the login form when rendered.
#[derive(Debug, Clone, Default)]
pub struct LoginView {
    pub email: String,
    pub errors: FormErrors,
    /// Catalog key of a service-level error.
    pub error: Option<String>,
}

/// State of the registration form when rendered.
#[derive(Debug, Clone, Default)]
pub struct RegisterView {
    pub name: String,
    pub email: String,
    pub errors: FormErrors,
    pub error: Option<String>,
    pub success: bool,
}

fn field_error(ctx: &PageContext<'_>, errors: &FormErrors, field: &str) -> String {
    errors
        .get(field)
        .map(|key| {
            format!(
                r#"<p class="field-error" role="alert">{}</p>"#,
                escape(&ctx.t(key))
            )
        })
        .unwrap_or_default()
}

fn alert(ctx: &PageContext<'_>, key: Option<&str>) -> String {
    key.map(|key| {
        format!(
            r#"<div class="alert alert-error" role="alert">{}</div>"#,
            escape(&ctx.t(key))
        )
    })
    .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn input(
    ctx: &PageContext<'_>,
    errors: &FormErrors,
    name: &str,
    kind: &str,
    label_key: &str,
    placeholder_key: &str,
    value: &str,
    autocomplete: &str,
) -> String {
    format!(
        r#"<label class="field">
            <span>{label}</span>
            <input type="{kind}" name="{name}" value="{value}" placeholder="{placeholder}" autocomplete="{autocomplete}">
            {error}
        </label>"#,
        label = escape(&ctx.t(label_key)),
        placeholder = escape(&ctx.t(placeholder_key)),
        value = escape(value),
        error = field_error(ctx, errors, name),
    )
}

#[must_use]
pub fn login_page(locale: Locale, path: &str, view: &LoginView) -> String {
    let ctx = PageContext::new(locale, path);
    let title = ctx.t("Login.title");

    let content = format!(
        r#"<section class="card auth-card">
    <h1>{title}</h1>
    {alert}
    <form method="post" action="/{locale}/login" novalidate>
        {email}
        {password}
        <button type="submit" class="primary">{submit}</button>
    </form>
    <p class="auth-switch">{no_account} <a href="/{locale}/register">{register}</a></p>
</section>"#,
        title = escape(&title),
        alert = alert(&ctx, view.error.as_deref()),
        email = input(
            &ctx,
            &view.errors,
            "email",
            "email",
            "Login.email",
            "Login.emailPlaceholder",
            &view.email,
            "email",
        ),
        password = input(
            &ctx,
            &view.errors,
            "password",
            "password",
            "Login.password",
            "Login.passwordPlaceholder",
            "",
            "current-password",
        ),
        submit = escape(&ctx.t("Login.submit")),
        no_account = escape(&ctx.t("Login.noAccount")),
        register = escape(&ctx.t("Login.register")),
    );

    html_shell(&ctx, &title, &content)
}

#[must_use]
pub fn register_page(locale: Locale, path: &str, view: &RegisterView) -> String {
    let ctx = PageContext::new(locale, path);
    let title = ctx.t("Register.title");

    if view.success {
        let refresh = format!(
            r#"<meta http-equiv="refresh" content="{secs};url=/{locale}/login">"#,
            secs = REGISTER_REDIRECT_SECS,
        );
        let content = format!(
            r#"<section class="card auth-card">
    <h1>{title}</h1>
    <div class="alert alert-success" role="status">{message}</div>
    <p class="auth-switch"><a href="/{locale}/login">{sign_in}</a></p>
</section>"#,
            title = escape(&title),
            message = escape(&ctx.t("Register.successMessage")),
            sign_in = escape(&ctx.t("Register.signIn")),
        );
        return html_shell_with_head(&ctx, &title, &refresh, &content);
    }

    let errors = &view.errors;
    let content = format!(
        r#"<section class="card auth-card">
    <h1>{title}</h1>
    {alert}
    <form method="post" action="/{locale}/register" novalidate>
        {name}
        {email}
        {password}
        {confirm}
        <button type="submit" class="primary">{submit}</button>
    </form>
    <p class="auth-switch">{have_account} <a href="/{locale}/login">{sign_in}</a></p>
</section>"#,
        title = escape(&title),
        alert = alert(&ctx, view.error.as_deref()),
        name = input(
            &ctx,
            errors,
            "name",
            "text",
            "Register.fullName",
            "Register.fullNamePlaceholder",
            &view.name,
            "name",
        ),
        email = input(
            &ctx,
            errors,
            "email",
            "email",
            "Register.email",
            "Register.emailPlaceholder",
            &view.email,
            "email",
        ),
        password = input(
            &ctx,
            errors,
            "password",
            "password",
            "Register.password",
            "Register.passwordPlaceholder",
            "",
            "new-password",
        ),
        confirm = input(
            &ctx,
            errors,
            "confirmPassword",
            "password",
            "Register.confirmPassword",
            "Register.confirmPasswordPlaceholder",
            "",
            "new-password",
        ),
        submit = escape(&ctx.t("Register.signUp")),
        have_account = escape(&ctx.t("Register.alreadyHaveAccount")),
        sign_in = escape(&ctx.t("Register.signIn")),
    );

    html_shell(&ctx, &title, &content)
}
