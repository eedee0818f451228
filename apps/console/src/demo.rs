//! Scripted walkthroughs of the user store and the date picker.

use calendar::{DatePicker, PickerEvent, PickerOutput, WEEKDAY_LABELS};
use entities::{CreateUserRequest, UpdateUserRequest, UserStatus};
use user_store::{UserStore, UserTransport};

/// Drives the store through its lifecycle the way a user list page would.
pub async fn run_store_demo<T: UserTransport>(store: &UserStore<T>) {
    // Mount
    store.list().await;
    report(store, "Loaded users").await;

    store
        .create(CreateUserRequest::new("Ada Lovelace", "ada@example.com"))
        .await;
    report(store, "Created user").await;

    let Some(created) = store.snapshot().await.users.last().cloned() else {
        return;
    };

    store.get_by_id(&created.id).await;
    store
        .update(
            &created.id,
            UpdateUserRequest::default().status(UserStatus::Inactive),
        )
        .await;
    report(store, "Updated user").await;

    // Surfaces NotFound through the error slot.
    store.delete("missing").await;
    report(store, "Deleted missing user").await;
    store.clear_error().await;

    store.delete(&created.id).await;
    report(store, "Deleted user").await;
}

async fn report<T: UserTransport>(store: &UserStore<T>, step: &str) {
    let state = store.snapshot().await;
    match state.error_message() {
        Some(error) => tracing::warn!(step, error = %error, "Store reported an error"),
        None => tracing::info!(
            step,
            users = state.users.len(),
            selected = state.selected_user.as_ref().map(|u| u.id.as_str()).unwrap_or("-"),
            "Store updated"
        ),
    }
}

/// Opens the picker, picks the 15th and returns the rendered calendar.
pub fn run_picker_demo(picker: &mut DatePicker) -> String {
    picker.handle(PickerEvent::Toggle);

    let pick = picker
        .grid()
        .into_iter()
        .find(|d| !d.other_month && d.day() == 15);
    if let Some(day) = pick {
        if let PickerOutput::DateSelected(date) = picker.handle(PickerEvent::DayClicked(day)) {
            tracing::info!(%date, "Date selected");
        }
    }

    render_calendar(picker)
}

/// Renders the picker's grid as text.
///
/// Selected day is bracketed, adjacent-month days are parenthesized.
pub fn render_calendar(picker: &DatePicker) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:^28}\n", picker.month_label()));
    for label in WEEKDAY_LABELS {
        out.push_str(&format!(" {label} "));
    }
    out.push('\n');

    for week in picker.grid().chunks(7) {
        for day in week {
            let cell = if picker.is_selected(day) {
                format!("[{:>2}]", day.day())
            } else if day.other_month {
                format!("({:>2})", day.day())
            } else {
                format!(" {:>2} ", day.day())
            };
            out.push_str(&cell);
        }
        out.push('\n');
    }

    out.push_str(&format!(
        "Value: {}\n",
        match picker.formatted_value() {
            v if v.is_empty() => picker.placeholder().to_string(),
            v => v,
        }
    ));
    out
}
