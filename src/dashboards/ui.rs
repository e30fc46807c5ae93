use std::fmt::Write;

use crate::calendar::{DayGroup, EventView};
use crate::core::shared::models::User;
use crate::core::shared::utils::html_escape;
use crate::core::urls::ApiUrls;
use crate::forms::FormErrors;

use super::types::{
    DashboardContext, SECTION_CLIENTS, SECTION_OVERVIEW, SECTION_PLANNING, SECTION_SERVICES,
    SHOW_CATEGORY_FORM, SHOW_SERVICE_FORM,
};

const STYLE: &str = r#"
        * { box-sizing: border-box; margin: 0; padding: 0; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f5f5f5; color: #1a1a1a; }
        .container { max-width: 1400px; margin: 0 auto; padding: 24px; }
        .header { display: flex; justify-content: space-between; align-items: center; margin-bottom: 24px; }
        .header h1 { font-size: 28px; }
        .btn { padding: 8px 16px; border: none; border-radius: 8px; cursor: pointer; font-size: 14px; font-weight: 500; background: #eee; text-decoration: none; color: inherit; }
        .btn-primary { background: #0066cc; color: white; }
        .btn-danger { background: #fdecea; color: #b3261e; }
        .tabs { display: flex; gap: 4px; margin-bottom: 24px; border-bottom: 1px solid #e0e0e0; }
        .tab { padding: 12px 24px; color: #666; text-decoration: none; border-bottom: 2px solid transparent; }
        .tab.active { color: #0066cc; border-bottom-color: #0066cc; }
        .section { display: none; background: white; border-radius: 12px; padding: 24px; box-shadow: 0 2px 8px rgba(0,0,0,0.08); }
        .section.active { display: block; }
        .messages { margin-bottom: 16px; }
        .message { padding: 10px 16px; border-radius: 8px; background: #fdecea; color: #b3261e; margin-bottom: 8px; }
        .errors { color: #b3261e; font-size: 13px; list-style: none; margin: 4px 0; }
        .modal { border: 1px solid #ddd; border-radius: 12px; padding: 16px; margin: 16px 0; background: #fafafa; }
        .field { display: flex; flex-direction: column; gap: 4px; margin-bottom: 12px; }
        .field input, .field select { padding: 8px 12px; border: 1px solid #ddd; border-radius: 8px; }
        table { width: 100%; border-collapse: collapse; }
        th, td { text-align: left; padding: 8px; border-bottom: 1px solid #eee; }
        .planner { display: grid; grid-template-columns: 64px repeat(7, 1fr); gap: 8px; }
        .hours, .day-body { position: relative; height: 720px; }
        .hour { height: 60px; font-size: 12px; color: #666; }
        .day-header { font-weight: 600; text-align: center; margin-bottom: 8px; }
        .event { position: absolute; left: 2px; right: 2px; border-radius: 6px; padding: 4px 6px; color: white; font-size: 12px; overflow: hidden; }
        .event form { display: inline; }
        .stats { display: flex; gap: 24px; }
        .stat { padding: 16px; background: #f0f7ff; border-radius: 8px; min-width: 160px; }
"#;

fn errors_list(errors: &[String]) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let items: String = errors
        .iter()
        .map(|e| format!("<li>{}</li>", html_escape(e)))
        .collect();
    format!(r#"<ul class="errors">{items}</ul>"#)
}

fn text_field(name: &str, label: &str, value: &str, input_type: &str, errors: &FormErrors) -> String {
    format!(
        r#"<label class="field">{label}<input type="{input_type}" name="{name}" value="{value}">{errors}</label>"#,
        label = html_escape(label),
        value = html_escape(value),
        errors = errors_list(errors.field(name)),
    )
}

fn hidden(name: &str, value: &str) -> String {
    format!(
        r#"<input type="hidden" name="{name}" value="{}">"#,
        html_escape(value)
    )
}

fn action_button(action: &str, fields: &[(&str, &str)], label: &str, class: &str) -> String {
    let inputs: String = fields.iter().map(|(k, v)| hidden(k, v)).collect();
    format!(
        r#"<form method="post" action="/">{action_input}{inputs}<button class="btn {class}" type="submit">{label}</button></form>"#,
        action_input = hidden("action", action),
        label = html_escape(label),
    )
}

fn render_tabs(active: &str) -> String {
    [
        (SECTION_OVERVIEW, "Vue d'ensemble"),
        (SECTION_SERVICES, "Prestations"),
        (SECTION_CLIENTS, "Clients"),
        (SECTION_PLANNING, "Planning"),
    ]
    .iter()
    .map(|(section, label)| {
        let class = if *section == active { "tab active" } else { "tab" };
        format!(
            r#"<a class="{class}" href="{href}">{label}</a>"#,
            href = html_escape(&ApiUrls::dashboard_section(section)),
        )
    })
    .collect()
}

fn section_open(id: &str, active: &str) -> String {
    let class = if id == active { "section active" } else { "section" };
    format!(r#"<section id="{id}" class="{class}">"#)
}

fn render_overview(ctx: &DashboardContext) -> String {
    let upcoming: usize = ctx.planning_days.iter().map(|d| d.events.len()).sum();
    format!(
        r#"<div class="stats">
            <div class="stat"><strong>{services}</strong><br>prestations</div>
            <div class="stat"><strong>{clients}</strong><br>clients</div>
            <div class="stat"><strong>{upcoming}</strong><br>rendez-vous cette semaine</div>
        </div>"#,
        services = ctx.user_services.len(),
        clients = ctx.clients.len(),
    )
}

fn render_category_form(ctx: &DashboardContext) -> String {
    if !ctx.show_category_modal {
        return String::new();
    }
    let form = &ctx.category_form;
    format!(
        r#"<div class="modal" id="category-modal"><h3>Nouvelle catégorie</h3>
        <form method="post" action="/">{action}{errors}{name}
        <button class="btn btn-primary" type="submit">Enregistrer</button></form></div>"#,
        action = hidden("action", "add_category"),
        errors = errors_list(form.errors.non_field()),
        name = text_field("name", "Nom", &form.name, "text", &form.errors),
    )
}

fn render_service_form(ctx: &DashboardContext) -> String {
    if !ctx.show_service_modal {
        return String::new();
    }
    let form = &ctx.service_form;
    let (title, action, id_field) = match form.service_id {
        Some(id) => (
            "Modifier la prestation",
            "update_service",
            hidden("service_id", &id.to_string()),
        ),
        None => ("Nouvelle prestation", "add_service", String::new()),
    };

    let mut options = String::from(r#"<option value="">---------</option>"#);
    for category in &ctx.all_categories {
        let id = category.id.to_string();
        let selected = if id == form.category { " selected" } else { "" };
        let _ = write!(
            options,
            r#"<option value="{id}"{selected}>{}</option>"#,
            html_escape(&category.name)
        );
    }

    format!(
        r#"<div class="modal" id="service-modal"><h3>{title}</h3>
        <form method="post" action="/">{action_input}{id_field}{errors}
        {name}
        <label class="field">Catégorie<select name="category">{options}</select>{category_errors}</label>
        {price}{duration}
        <button class="btn btn-primary" type="submit">Enregistrer</button></form></div>"#,
        action_input = hidden("action", action),
        errors = errors_list(form.errors.non_field()),
        name = text_field("name", "Nom", &form.name, "text", &form.errors),
        category_errors = errors_list(form.errors.field("category")),
        price = text_field("price", "Prix (€)", &form.price, "text", &form.errors),
        duration = text_field(
            "duration_minutes",
            "Durée (minutes)",
            &form.duration_minutes,
            "number",
            &form.errors
        ),
    )
}

fn render_services(ctx: &DashboardContext) -> String {
    let mut html = format!(
        r#"<div class="header"><h2>Mes prestations</h2><div>
        <a class="btn" href="/?section=services&amp;show={SHOW_CATEGORY_FORM}">+ Catégorie</a>
        <a class="btn btn-primary" href="/?section=services&amp;show={SHOW_SERVICE_FORM}">+ Prestation</a>
        </div></div>"#
    );
    html.push_str(&render_category_form(ctx));
    html.push_str(&render_service_form(ctx));

    if ctx.categories.is_empty() {
        html.push_str("<p>Aucune prestation pour le moment.</p>");
    }
    for group in &ctx.categories {
        let _ = write!(
            html,
            r#"<h3>{name} <a class="btn" href="/?section=services&amp;show={SHOW_SERVICE_FORM}&amp;category={id}">+</a></h3>
            <table><thead><tr><th>Nom</th><th>Prix</th><th>Durée</th><th></th></tr></thead><tbody>"#,
            name = html_escape(&group.category.name),
            id = group.category.id,
        );
        for service in &group.services {
            let price = service
                .price
                .as_ref()
                .map(|p| format!("{p} €"))
                .unwrap_or_else(|| "—".to_string());
            let duration = service
                .duration_minutes
                .map(|d| format!("{d} min"))
                .unwrap_or_else(|| "—".to_string());
            let id = service.id.to_string();
            let _ = write!(
                html,
                r#"<tr><td>{name}</td><td>{price}</td><td>{duration}</td><td>
                <a class="btn" href="/?service_id={id}">Modifier</a>{delete}</td></tr>"#,
                name = html_escape(&service.name),
                price = html_escape(&price),
                delete = action_button("delete_service", &[("service_id", &id)], "Supprimer", "btn-danger"),
            );
        }
        html.push_str("</tbody></table>");
    }
    html
}

fn render_client_form(ctx: &DashboardContext) -> String {
    let form = &ctx.client_form;
    let state = if ctx.show_client_modal { " open" } else { "" };
    format!(
        r#"<details class="modal" id="client-modal"{state}><summary>Nouveau client</summary>
        <form method="post" action="/">{action}{link}{errors}{first}{last}{email}{phone}
        <button class="btn btn-primary" type="submit">Enregistrer</button></form></details>"#,
        action = hidden("action", "add_client"),
        link = hidden("linked_professional", &form.linked_professional),
        errors = errors_list(form.errors.non_field()),
        first = text_field("first_name", "Prénom", &form.first_name, "text", &form.errors),
        last = text_field("last_name", "Nom", &form.last_name, "text", &form.errors),
        email = text_field("email", "E-mail", &form.email, "email", &form.errors),
        phone = text_field("phone_number", "Téléphone", &form.phone_number, "tel", &form.errors),
    )
}

fn render_clients(ctx: &DashboardContext) -> String {
    if !ctx.is_professional {
        let mut html = "<p>La gestion des clients est réservée aux professionnels.</p>".to_string();
        if ctx.show_client_modal {
            html.push_str(&render_client_form(ctx));
        }
        return html;
    }

    let mut html = String::from(r#"<div class="header"><h2>Mes clients</h2></div>"#);
    html.push_str(&render_client_form(ctx));

    if ctx.clients.is_empty() {
        html.push_str("<p>Aucun client pour le moment.</p>");
        return html;
    }
    html.push_str(
        "<table><thead><tr><th>Nom</th><th>E-mail</th><th>Téléphone</th><th></th></tr></thead><tbody>",
    );
    for client in &ctx.clients {
        let id = client.id.to_string();
        let _ = write!(
            html,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            html_escape(&client.full_name),
            html_escape(&client.email),
            html_escape(&client.phone),
            action_button("delete_client", &[("client_id", &id)], "Supprimer", "btn-danger"),
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn render_event(event: &EventView) -> String {
    let delete = event
        .event_id
        .map(|id| {
            action_button(
                "delete_event",
                &[("event_id", &id.to_string())],
                "×",
                "btn-danger",
            )
        })
        .unwrap_or_default();
    format!(
        r#"<div class="event" style="top: {top:.4}%; height: {height:.4}%; background: {color};" title="{status}">
        <strong>{time}</strong><br>{title}<br><small>{client}</small>{delete}</div>"#,
        top = event.top_pct,
        height = event.height_pct,
        color = html_escape(&event.color),
        status = html_escape(&event.status),
        time = html_escape(&event.time),
        title = html_escape(&event.title),
        client = html_escape(&event.client),
    )
}

fn render_day(day: &DayGroup) -> String {
    let events: String = day.events.iter().map(render_event).collect();
    format!(
        r#"<div class="day"><div class="day-header">{label} {date}</div><div class="day-body">{events}</div></div>"#,
        label = html_escape(&day.label),
        date = html_escape(&day.date),
    )
}

fn render_event_form(ctx: &DashboardContext) -> String {
    if !ctx.is_professional {
        return String::new();
    }
    let services: String = ctx
        .user_services
        .iter()
        .map(|s| format!(r#"<option value="{}">{}</option>"#, s.id, html_escape(&s.name)))
        .collect();
    let clients: String = ctx
        .client_options
        .iter()
        .map(|c| format!(r#"<option value="{}">{}</option>"#, c.id, html_escape(&c.label)))
        .collect();
    format!(
        r#"<div class="modal" id="event-modal"><h3>Nouveau rendez-vous</h3>
        <form method="post" action="/">{action}
        <label class="field">Début<input type="datetime-local" name="start_at"></label>
        <label class="field">Fin<input type="datetime-local" name="end_at"></label>
        <label class="field">Prestation<select name="service_id"><option value="">---------</option>{services}</select></label>
        <label class="field">Client<select name="client_id"><option value="">---------</option>{clients}</select></label>
        <button class="btn btn-primary" type="submit">Planifier</button></form></div>"#,
        action = hidden("action", "add_event"),
    )
}

fn render_planning(ctx: &DashboardContext) -> String {
    let week_link = |offset: i64| {
        html_escape(&ApiUrls::with_query(
            ApiUrls::DASHBOARD,
            &[("section", SECTION_PLANNING), ("week_offset", &offset.to_string())],
        ))
    };
    let hours: String = ctx
        .planner_hours
        .iter()
        .map(|h| format!(r#"<div class="hour">{}</div>"#, html_escape(h)))
        .collect();
    let days: String = ctx.planning_days.iter().map(render_day).collect();

    format!(
        r#"<div class="header"><h2>{summary}</h2><div>
        <a class="btn" href="{previous}">←</a>
        <a class="btn" href="{current}">Aujourd'hui</a>
        <a class="btn" href="{next}">→</a></div></div>
        {form}
        <div class="planner"><div><div class="day-header">&nbsp;</div><div class="hours">{hours}</div></div>{days}</div>"#,
        summary = html_escape(&ctx.planner_week_summary),
        previous = week_link(ctx.week_offset - 1),
        current = week_link(0),
        next = week_link(ctx.week_offset + 1),
        form = render_event_form(ctx),
    )
}

/// Full dashboard page for `user`.
pub fn render_dashboard(ctx: &DashboardContext, user: &User) -> String {
    let messages: String = ctx
        .messages
        .iter()
        .map(|m| format!(r#"<div class="message">{}</div>"#, html_escape(m)))
        .collect();
    let active = ctx.section.as_str();

    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Tableau de bord</title>
    <style>{STYLE}</style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>Bonjour {name}</h1>
            <form method="post" action="{logout}"><button class="btn" type="submit">Se déconnecter</button></form>
        </div>
        <nav class="tabs">{tabs}</nav>
        <div class="messages">{messages}</div>
        {overview_open}{overview}</section>
        {services_open}{services}</section>
        {clients_open}{clients}</section>
        {planning_open}{planning}</section>
    </div>
</body>
</html>"#,
        name = html_escape(&user.display_name()),
        logout = ApiUrls::LOGOUT,
        tabs = render_tabs(active),
        overview_open = section_open(SECTION_OVERVIEW, active),
        overview = render_overview(ctx),
        services_open = section_open(SECTION_SERVICES, active),
        services = render_services(ctx),
        clients_open = section_open(SECTION_CLIENTS, active),
        clients = render_clients(ctx),
        planning_open = section_open(SECTION_PLANNING, active),
        planning = render_planning(ctx),
    )
}
