//! Admin dashboard: user table with search, position filter and paging.

use std::fmt::Write as _;

use super::escape;
use super::layout::{PageContext, html_shell};
use crate::i18n::t_with;
use crate::session::{Flash, FlashLevel};
use crate::users::{Position, PositionFilter, UserPage, UserQuery};

#[derive(Debug, Clone)]
pub struct DashboardView {
    pub query: UserQuery,
    pub page: UserPage,
    pub flash: Option<Flash>,
}

fn position_options(ctx: &PageContext<'_>, selected: Position) -> String {
    let mut html = String::new();
    if selected == Position::Unassigned {
        let _ = write!(
            html,
            r#"<option value="" selected disabled>{}</option>"#,
            escape(selected.as_stored())
        );
    }
    for position in Position::ASSIGNABLE {
        let _ = write!(
            html,
            r#"<option value="{slug}"{sel}>{label}</option>"#,
            slug = position.slug(),
            sel = if position == selected { " selected" } else { "" },
            label = escape(&ctx.t(position.label_key())),
        );
    }
    html
}

fn filter_options(ctx: &PageContext<'_>, selected: PositionFilter) -> String {
    let mut html = format!(
        r#"<option value="all"{sel}>{label}</option>"#,
        sel = if selected == PositionFilter::All {
            " selected"
        } else {
            ""
        },
        label = escape(&ctx.t("Dashboard.allPositions")),
    );
    for position in Position::ASSIGNABLE {
        let filter = PositionFilter::Only(position);
        let _ = write!(
            html,
            r#"<option value="{slug}"{sel}>{label}</option>"#,
            slug = filter.slug(),
            sel = if filter == selected { " selected" } else { "" },
            label = escape(&ctx.t(position.label_key())),
        );
    }
    html
}

fn flash_banner(ctx: &PageContext<'_>, flash: Option<&Flash>) -> String {
    flash
        .map(|flash| {
            let class = match flash.level {
                FlashLevel::Error => "alert-error",
                FlashLevel::Notice => "alert-success",
            };
            format!(
                r#"<div class="alert {class}" role="status">{}</div>"#,
                escape(&ctx.t(&flash.key))
            )
        })
        .unwrap_or_default()
}

#[must_use]
pub fn dashboard_page(ctx: &PageContext<'_>, view: &DashboardView) -> String {
    let locale = ctx.locale;
    let title = ctx.t("Dashboard.adminPanel");
    let return_to = view.query.to_query_string(view.page.page);

    let mut rows = String::new();
    for user in &view.page.users {
        let _ = write!(
            rows,
            r#"<tr>
    <td>{name}</td>
    <td>{email}</td>
    <td>
        <form method="post" action="/{locale}/dashboard/users/{id}/position" class="inline-form">
            <input type="hidden" name="return_to" value="{return_to}">
            <select name="position" aria-label="{position_label}">{options}</select>
            <button type="submit">{save}</button>
        </form>
    </td>
</tr>"#,
            name = escape(&user.name),
            email = escape(&user.email),
            id = escape(&user.id),
            return_to = escape(&return_to),
            position_label = escape(&ctx.t("Dashboard.position")),
            options = position_options(ctx, user.position),
            save = escape(&ctx.t("Dashboard.save")),
        );
    }
    if view.page.users.is_empty() {
        let _ = write!(
            rows,
            r#"<tr><td colspan="3" class="empty">{}</td></tr>"#,
            escape(&ctx.t("Dashboard.noUsers"))
        );
    }

    let previous = if view.page.has_previous {
        format!(
            r#"<a class="button" rel="prev" href="/{locale}/dashboard?{query}">{label}</a>"#,
            query = escape(&view.query.to_query_string(view.page.page - 1)),
            label = escape(&ctx.t("Dashboard.previous")),
        )
    } else {
        format!(
            r#"<span class="button disabled">{}</span>"#,
            escape(&ctx.t("Dashboard.previous"))
        )
    };
    let next = if view.page.has_next {
        format!(
            r#"<a class="button" rel="next" href="/{locale}/dashboard?{query}">{label}</a>"#,
            query = escape(&view.query.to_query_string(view.page.page + 1)),
            label = escape(&ctx.t("Dashboard.next")),
        )
    } else {
        format!(
            r#"<span class="button disabled">{}</span>"#,
            escape(&ctx.t("Dashboard.next"))
        )
    };

    let content = format!(
        r#"<section class="dashboard">
    <div class="dashboard-header">
        <h1>{title}</h1>
        <a class="button" href="/{locale}/chat">{access_chat}</a>
    </div>
    {flash}
    <form method="get" action="/{locale}/dashboard" class="filters">
        <input type="search" name="search" value="{search}" placeholder="{search_placeholder}">
        <select name="position">{filters}</select>
        <button type="submit">{search_label}</button>
    </form>
    <h2>{users} <small>{total}</small></h2>
    <table class="users">
        <thead><tr><th>{name}</th><th>{email}</th><th>{position}</th></tr></thead>
        <tbody>{rows}</tbody>
    </table>
    <nav class="pagination">{previous}<span>{page}</span>{next}</nav>
</section>"#,
        title = escape(&title),
        access_chat = escape(&ctx.t("Dashboard.accessChat")),
        flash = flash_banner(ctx, view.flash.as_ref()),
        search = escape(&view.query.search),
        search_placeholder = escape(&ctx.t("Dashboard.searchPlaceholder")),
        filters = filter_options(ctx, view.query.position),
        search_label = escape(&ctx.t("Dashboard.search")),
        users = escape(&ctx.t("Dashboard.users")),
        total = escape(&t_with(
            locale,
            "Dashboard.total",
            &[("total", view.page.total.to_string().as_str())]
        )),
        name = escape(&ctx.t("Dashboard.name")),
        email = escape(&ctx.t("Dashboard.email")),
        position = escape(&ctx.t("Dashboard.position")),
        page = escape(&t_with(
            locale,
            "Dashboard.page",
            &[("page", view.page.page.to_string().as_str())]
        )),
    );

    html_shell(ctx, &title, &content)
}
