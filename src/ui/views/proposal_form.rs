use crate::api::sync::SyncClient;
use crate::api::types::{Demand, PointOfView, Proposal, State};
use crate::fetch::{Fetch, FetchState};
use crate::format;
use crate::ui::components::{AlertDialog, ConfirmDialog, ConfirmEvent, KeyResult, TextInput};
use crate::ui::view::{Shortcut, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use serde_json::{json, Value};
use std::time::Duration;

/// How long to wait before refreshing the demand grid after a proposal
/// submission; the backend finishes its side effects (demand/proposal
/// cross-linking) in the meantime.
const REFRESH_AFTER_SUBMIT: Duration = Duration::from_secs(7);

const PRICE: usize = 0;
const TOTAL: usize = 1;
const QUANTITY: usize = 2;
const DATE: usize = 3;
const TIME: usize = 4;
const CRITERIA: usize = 5;

struct FormField {
  label: &'static str,
  input: TextInput,
}

impl FormField {
  fn new(label: &'static str, value: impl Into<String>) -> Self {
    Self {
      label,
      input: TextInput::with_value(value),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitKind {
  /// Create or update through the form fields
  Save,
  /// State transition to cancelled
  Cancel,
  /// State transition to closed
  Close,
}

/// The proposal dialog, keyed to one demand row.
///
/// Opened without a proposal key it is a creation form; with one, the
/// proposal is loaded cache-first and the form becomes an
/// update/view/close surface depending on the proposal's state. The
/// server stays the authority on which transitions are actually legal.
pub struct ProposalFormView {
  sync: SyncClient,
  point_of_view: PointOfView,
  demand: Demand,
  proposal_key: Option<u64>,
  /// Last-known snapshot of the open proposal
  proposal: Option<Proposal>,
  load: Option<Fetch<Proposal>>,
  submit: Option<(SubmitKind, Fetch<Proposal>)>,
  fields: Vec<FormField>,
  focus: usize,
  confirm: ConfirmDialog,
  alert: AlertDialog,
}

impl ProposalFormView {
  pub fn new(
    sync: SyncClient,
    point_of_view: PointOfView,
    demand: Demand,
    proposal_key: Option<u64>,
  ) -> Self {
    let due = format::parse_iso(&demand.due_date);
    let date_value = due
      .map(|d| d.format("%Y-%m-%d").to_string())
      .unwrap_or_default();
    let time_value = due
      .map(|d| d.format("%H:%M").to_string())
      .unwrap_or_default();

    let fields = vec![
      FormField::new("Price", ""),
      FormField::new("Total", ""),
      FormField::new("Quantity", demand.quantity.to_string()),
      FormField::new("Date", date_value),
      FormField::new("Time", time_value),
      FormField::new("Criteria", ""),
    ];

    let mut view = Self {
      sync,
      point_of_view,
      demand,
      proposal_key,
      proposal: None,
      load: None,
      submit: None,
      fields,
      focus: PRICE,
      confirm: ConfirmDialog::new(),
      alert: AlertDialog::new(),
    };

    if let Some(key) = proposal_key {
      // Cache first; the grid refresh already evicted anything stale.
      if let Some(proposal) = view.sync.cached_proposal(key) {
        view.apply_proposal(proposal);
      } else {
        let sync = view.sync.clone();
        let pov = view.point_of_view;
        view.load = Some(Fetch::spawn(move || {
          let sync = sync.clone();
          async move {
            sync
              .fetch_proposal(key, Some(pov))
              .await
              .map_err(|e| e.to_string())
          }
        }));
      }
    }

    view
  }

  /// Fill the editable fields from a loaded proposal snapshot.
  fn apply_proposal(&mut self, proposal: Proposal) {
    self.fields[PRICE].input.set_value(trim_number(proposal.price));
    self.fields[TOTAL].input.set_value(trim_number(proposal.total));
    self.fields[QUANTITY]
      .input
      .set_value(proposal.quantity.to_string());
    if let Some(due) = format::parse_iso(&proposal.due_date) {
      self.fields[DATE]
        .input
        .set_value(due.format("%Y-%m-%d").to_string());
      self.fields[TIME]
        .input
        .set_value(due.format("%H:%M").to_string());
    }
    self.fields[CRITERIA]
      .input
      .set_value(format::display_criteria(proposal.criteria.as_ref()));
    self.proposal = Some(proposal);
  }

  fn proposal_state(&self) -> Option<State> {
    self.proposal.as_ref().map(|p| p.state)
  }

  /// A confirmed proposal is closed, not updated; a declined one takes
  /// no submission at all.
  fn can_submit(&self) -> bool {
    !matches!(
      self.proposal_state(),
      Some(State::Confirmed) | Some(State::Declined)
    )
  }

  fn can_close(&self) -> bool {
    self.proposal_state() == Some(State::Confirmed)
  }

  fn can_cancel(&self) -> bool {
    self.proposal.is_some()
  }

  fn is_saving(&self) -> bool {
    self
      .submit
      .as_ref()
      .is_some_and(|(_, fetch)| fetch.is_busy())
  }

  fn is_loading(&self) -> bool {
    self.load.as_ref().is_some_and(|fetch| fetch.is_busy())
  }

  fn submit_save(&mut self) {
    if !self.can_submit() || self.is_saving() {
      return;
    }
    let data = build_submission(
      self.demand.key,
      self.proposal_key,
      self.fields[PRICE].input.value(),
      self.fields[TOTAL].input.value(),
      self.fields[QUANTITY].input.value(),
      self.fields[DATE].input.value(),
      self.fields[TIME].input.value(),
      self.fields[CRITERIA].input.value(),
    );
    self.start_submit(SubmitKind::Save, data, self.proposal_key);
  }

  /// Ask before cancelling; the warning is sharper when the proposal
  /// was already confirmed.
  fn request_cancel(&mut self) {
    let Some(proposal) = &self.proposal else {
      return;
    };
    let message = if proposal.state == State::Confirmed {
      format!(
        "Proposal {} is confirmed.\nCancel it anyway and reopen demand {}?",
        proposal.key, proposal.demand_key
      )
    } else {
      format!(
        "Cancel proposal {} attached to demand {}?",
        proposal.key, proposal.demand_key
      )
    };
    self.confirm.show(message);
  }

  fn submit_transition(&mut self, kind: SubmitKind, state: State) {
    let Some(key) = self.proposal_key else {
      return;
    };
    self.start_submit(kind, json!({ "state": state }), Some(key));
  }

  fn start_submit(&mut self, kind: SubmitKind, data: Value, key: Option<u64>) {
    let sync = self.sync.clone();
    self.submit = Some((
      kind,
      Fetch::spawn(move || {
        let sync = sync.clone();
        let data = data.clone();
        async move {
          sync
            .save_proposal(data, key)
            .await
            .map_err(|e| e.to_string())
        }
      }),
    ));
  }

  fn focus_next(&mut self) {
    self.focus = (self.focus + 1) % self.fields.len();
  }

  fn focus_prev(&mut self) {
    self.focus = if self.focus == 0 {
      self.fields.len() - 1
    } else {
      self.focus - 1
    };
  }

  fn title(&self) -> String {
    let mut title = match self.proposal_key {
      None => format!(" New proposal for demand {} ", self.demand.key),
      Some(key) => format!(" Proposal {} / demand {} ", key, self.demand.key),
    };
    if self.is_loading() {
      title.push_str("(loading...) ");
    } else if self.is_saving() {
      title.push_str("(saving...) ");
    }
    title
  }

  fn render_form(&self, frame: &mut Frame, area: Rect) {
    let block = Block::default()
      .title(self.title())
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 {
      return;
    }

    let label_style = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
      Line::from(vec![
        Span::styled("Demand:   ", label_style),
        Span::styled(format!("◆ {}", self.demand.key), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(self.demand.state.label(), Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled("Qty: ", label_style),
        Span::raw(self.demand.quantity.to_string()),
      ]),
      Line::from(vec![
        Span::styled("Due:      ", label_style),
        Span::raw(format::display_date_time(&self.demand.due_date)),
      ]),
      Line::from(vec![
        Span::styled("Criteria: ", label_style),
        Span::raw(format::display_criteria(self.demand.criteria.as_ref())),
      ]),
      Line::from(Span::styled(
        "─".repeat(inner.width as usize),
        label_style,
      )),
    ];

    for (index, field) in self.fields.iter().enumerate() {
      let focused = index == self.focus;
      let mut spans = vec![Span::styled(format!("{:<10}", format!("{}:", field.label)), label_style)];
      if focused {
        spans.push(Span::styled(
          field.input.value().to_string(),
          Style::default().fg(Color::White).bold(),
        ));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
      } else {
        spans.push(Span::raw(field.input.value().to_string()));
      }
      lines.push(Line::from(spans));
    }

    if let Some(proposal) = &self.proposal {
      lines.push(Line::from(Span::styled(
        "─".repeat(inner.width as usize),
        label_style,
      )));
      lines.push(Line::from(vec![
        Span::styled("State:    ", label_style),
        Span::styled(
          proposal.state.label(),
          Style::default().fg(crate::ui::renderfns::state_color(proposal.state)),
        ),
        Span::raw("   "),
        Span::styled("Modified: ", label_style),
        Span::raw(format::display_date_time(&proposal.modification_date)),
      ]));
    }

    lines.push(Line::raw(""));
    lines.push(self.action_hints());

    frame.render_widget(Paragraph::new(lines), inner);
  }

  fn action_hints(&self) -> Line<'static> {
    let key_style = Style::default().fg(Color::Cyan);
    let label_style = Style::default().fg(Color::DarkGray);
    let mut spans = Vec::new();

    if self.can_submit() {
      let label = if self.proposal_key.is_none() {
        " create"
      } else {
        " update"
      };
      spans.push(Span::styled("<C-s>", key_style));
      spans.push(Span::styled(label, label_style));
      spans.push(Span::raw("   "));
    }
    if self.can_cancel() {
      spans.push(Span::styled("<C-k>", key_style));
      spans.push(Span::styled(" cancel proposal", label_style));
      spans.push(Span::raw("   "));
    }
    if self.can_close() {
      spans.push(Span::styled("<C-l>", key_style));
      spans.push(Span::styled(" close proposal", label_style));
      spans.push(Span::raw("   "));
    }
    if self.proposal_state() == Some(State::Declined) {
      spans.push(Span::styled(
        "declined, read only",
        Style::default().fg(Color::Red),
      ));
      spans.push(Span::raw("   "));
    }
    spans.push(Span::styled("<Esc>", key_style));
    spans.push(Span::styled(" back", label_style));

    Line::from(spans)
  }
}

impl View for ProposalFormView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match self.alert.handle_key(key) {
      KeyResult::NotHandled => {}
      _ => return ViewAction::None,
    }

    match self.confirm.handle_key(key) {
      KeyResult::Event(ConfirmEvent::Confirmed) => {
        self.submit_transition(SubmitKind::Cancel, State::Cancelled);
        return ViewAction::None;
      }
      KeyResult::Event(ConfirmEvent::Rejected) => return ViewAction::None,
      KeyResult::Handled => return ViewAction::None,
      KeyResult::NotHandled => {}
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
      match key.code {
        KeyCode::Char('s') => {
          self.submit_save();
          return ViewAction::None;
        }
        KeyCode::Char('k') => {
          if self.can_cancel() {
            self.request_cancel();
          }
          return ViewAction::None;
        }
        KeyCode::Char('l') => {
          if self.can_close() {
            self.submit_transition(SubmitKind::Close, State::Closed);
          }
          return ViewAction::None;
        }
        _ => {}
      }
    }

    match key.code {
      KeyCode::Esc => return ViewAction::Pop,
      KeyCode::Tab | KeyCode::Down | KeyCode::Enter => {
        self.focus_next();
        return ViewAction::None;
      }
      KeyCode::BackTab | KeyCode::Up => {
        self.focus_prev();
        return ViewAction::None;
      }
      _ => {}
    }

    let _ = self.fields[self.focus].input.handle_key(key);
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    self.render_form(frame, area);
    self.confirm.render_overlay(frame, area);
    self.alert.render_overlay(frame, area);
  }

  fn breadcrumb_label(&self) -> String {
    match self.proposal_key {
      None => format!("New proposal (demand {})", self.demand.key),
      Some(key) => format!("Proposal {}", key),
    }
  }

  fn tick(&mut self) -> ViewAction {
    // Pending proposal load (update/view mode, cache miss)
    let mut loaded = None;
    if let Some(fetch) = self.load.as_mut() {
      if fetch.poll() {
        match fetch.state() {
          FetchState::Ready(proposal) => loaded = Some(Ok(proposal.clone())),
          FetchState::Failed(error) => loaded = Some(Err(error.clone())),
          _ => {}
        }
      }
    }
    match loaded {
      Some(Ok(proposal)) => {
        self.load = None;
        self.apply_proposal(proposal);
      }
      Some(Err(error)) => {
        self.load = None;
        self.alert.show(error);
      }
      None => {}
    }

    // Pending submission
    let mut completed = None;
    if let Some((kind, fetch)) = self.submit.as_mut() {
      if fetch.poll() {
        match fetch.state() {
          FetchState::Ready(_) => completed = Some((*kind, Ok(()))),
          FetchState::Failed(error) => completed = Some((*kind, Err(error.clone()))),
          _ => {}
        }
      }
    }
    if let Some((kind, result)) = completed {
      self.submit = None;
      match result {
        Ok(()) => {
          let delay = match kind {
            SubmitKind::Save => REFRESH_AFTER_SUBMIT,
            SubmitKind::Cancel | SubmitKind::Close => Duration::ZERO,
          };
          return ViewAction::PopAndRefresh(delay);
        }
        Err(error) => self.alert.show(error),
      }
    }

    ViewAction::None
  }

  fn shortcuts(&self) -> Vec<Shortcut> {
    vec![
      Shortcut::new("tab", "next field"),
      Shortcut::new("C-s", "submit"),
      Shortcut::new("esc", "back"),
    ]
  }

  fn wants_text_input(&self) -> bool {
    true
  }
}

/// Build the submission payload from raw form inputs.
///
/// Numeric fields that do not parse are dropped rather than sent as
/// garbage; the criteria string splits on whitespace, commas and
/// semicolons; date and time combine into a single ISO timestamp; and
/// every proposal from this console carries the golf hash tag.
#[allow(clippy::too_many_arguments)]
fn build_submission(
  demand_key: u64,
  proposal_key: Option<u64>,
  price: &str,
  total: &str,
  quantity: &str,
  date: &str,
  time: &str,
  criteria: &str,
) -> Value {
  let mut data = serde_json::Map::new();
  data.insert("demandKey".to_string(), json!(demand_key));
  if let Some(key) = proposal_key {
    data.insert("key".to_string(), json!(key));
  }
  if let Ok(price) = price.trim().parse::<f64>() {
    data.insert("price".to_string(), json!(price));
  }
  if let Ok(total) = total.trim().parse::<f64>() {
    data.insert("total".to_string(), json!(total));
  }
  if let Ok(quantity) = quantity.trim().parse::<u32>() {
    data.insert("quantity".to_string(), json!(quantity));
  }
  data.insert(
    "criteria".to_string(),
    json!(format::split_criteria(criteria)),
  );
  if let Some(due_date) = format::to_iso_string(date, time) {
    data.insert("dueDate".to_string(), json!(due_date));
  }
  data.insert("hashTags".to_string(), json!(["golf"]));
  Value::Object(data)
}

fn trim_number(value: f64) -> String {
  if value == value.trunc() {
    format!("{}", value as i64)
  } else {
    format!("{value}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_submission_normalizes_numbers() {
    let data = build_submission(7, None, "45.50", "91", "2", "2024-01-15", "10:30", "green fees");
    assert_eq!(data["demandKey"], json!(7));
    assert_eq!(data["price"], json!(45.5));
    assert_eq!(data["total"], json!(91.0));
    assert_eq!(data["quantity"], json!(2));
    assert!(data.get("key").is_none());
  }

  #[test]
  fn test_submission_drops_unparseable_numbers() {
    let data = build_submission(7, None, "", "n/a", "two", "2024-01-15", "10:30", "");
    assert!(data.get("price").is_none());
    assert!(data.get("total").is_none());
    assert!(data.get("quantity").is_none());
  }

  #[test]
  fn test_submission_splits_criteria() {
    let data = build_submission(7, None, "1", "1", "1", "", "", "green fees, twosome;sunday");
    assert_eq!(data["criteria"], json!(["green", "fees", "twosome", "sunday"]));
  }

  #[test]
  fn test_submission_combines_date_and_time() {
    let data = build_submission(7, Some(42), "1", "1", "1", "2024-01-15", "10:30", "");
    assert_eq!(data["dueDate"], json!("2024-01-15T10:30:00Z"));
    assert_eq!(data["key"], json!(42));
  }

  #[test]
  fn test_submission_drops_unparseable_due_date() {
    let data = build_submission(7, None, "1", "1", "1", "someday", "soon", "");
    assert!(data.get("dueDate").is_none());
  }

  #[test]
  fn test_submission_carries_golf_tag() {
    let data = build_submission(7, None, "1", "1", "1", "", "", "");
    assert_eq!(data["hashTags"], json!(["golf"]));
  }

  #[test]
  fn test_trim_number() {
    assert_eq!(trim_number(45.0), "45");
    assert_eq!(trim_number(45.5), "45.5");
  }
}
