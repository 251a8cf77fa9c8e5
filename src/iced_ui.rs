use std::sync::Arc;

use iced::widget::{
    button, column, container, row, scrollable, text, text_editor, text_input, Space,
};
use iced::{application, Background, Border, Color, Element, Length, Shadow, Size, Task, Theme};

use crate::notice::{Notice, NoticeLevel};
use crate::render::render_history;
use crate::services::{PromptInput, Session, Submission, WebhookConfig, WebhookTester};
use crate::storage::Storage;
use crate::webhook::WebhookClient;

#[derive(Clone)]
pub struct IcedUiLaunchConfig {
    pub storage: Arc<dyn Storage>,
}

struct HookPromptApp {
    session: Session,
    webhook: WebhookConfig,
    tester: Arc<WebhookTester>,
    input: Arc<PromptInput>,
    composer: text_editor::Content,
    sending: bool,
    testing: bool,
    notice: Option<Notice>,
}

#[derive(Clone, Debug)]
enum Message {
    ToggleWebhookPanel,
    WebhookUrlChanged(String),
    SaveWebhookPressed,
    TestWebhookPressed,
    WebhookTested(Result<Notice, String>),
    PromptEdited(text_editor::Action),
    SendPressed,
    PromptFinished(Result<Submission, String>),
    ClearHistoryPressed,
}

pub fn launch_ui(config: IcedUiLaunchConfig) -> iced::Result {
    application(
        move || (HookPromptApp::new(config.storage.clone()), Task::none()),
        update,
        view,
    )
    .title(app_title)
    .theme(app_theme)
    .window(iced::window::Settings {
        size: Size::new(860.0, 920.0),
        min_size: Some(Size::new(560.0, 640.0)),
        ..Default::default()
    })
    .run()
}

fn app_title(_state: &HookPromptApp) -> String {
    "Send Prompts to n8n".to_string()
}

fn app_theme(_state: &HookPromptApp) -> Theme {
    Theme::Dark
}

impl HookPromptApp {
    fn new(storage: Arc<dyn Storage>) -> Self {
        let mut notice = None;
        let session = Session::load(storage.clone()).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to load session");
            notice = Some(Notice::error(err.user_message()));
            Session::empty(storage.clone())
        });
        let webhook = WebhookConfig::load(storage.clone()).unwrap_or_else(|err| {
            tracing::error!(error = %err, "failed to load webhook config");
            WebhookConfig::empty(storage.clone())
        });
        let client = WebhookClient::new();

        Self {
            session,
            webhook,
            tester: Arc::new(WebhookTester::new(client.clone())),
            input: Arc::new(PromptInput::new(client)),
            composer: text_editor::Content::new(),
            sending: false,
            testing: false,
            notice,
        }
    }

    fn prompt_text(&self) -> String {
        self.composer.text()
    }
}

fn update(state: &mut HookPromptApp, message: Message) -> Task<Message> {
    match message {
        Message::ToggleWebhookPanel => {
            let open = !state.webhook.is_open();
            state.webhook.set_open(open);
            Task::none()
        }
        Message::WebhookUrlChanged(value) => {
            state.webhook.set_url(value);
            Task::none()
        }
        Message::SaveWebhookPressed => {
            match state.webhook.save_current() {
                Ok(saved) => {
                    state.session.on_webhook_saved(saved.url);
                    state.notice = Some(saved.notice);
                }
                Err(err) => state.notice = Some(Notice::error(err.user_message())),
            }
            Task::none()
        }
        Message::TestWebhookPressed => {
            if state.testing {
                return Task::none();
            }
            state.testing = true;
            let tester = state.tester.clone();
            let url = state.webhook.url().to_string();
            Task::perform(
                async move {
                    tester
                        .test(&url)
                        .await
                        .map_err(|err| err.user_message().to_string())
                },
                Message::WebhookTested,
            )
        }
        Message::WebhookTested(result) => {
            state.testing = false;
            state.notice = Some(match result {
                Ok(notice) => notice,
                Err(err) => Notice::error(err),
            });
            Task::none()
        }
        Message::PromptEdited(action) => {
            state.composer.perform(action);
            Task::none()
        }
        Message::SendPressed => {
            if state.sending {
                return Task::none();
            }
            state.sending = true;
            let input = state.input.clone();
            let prompt = state.prompt_text();
            let url = state.session.webhook_url().to_string();
            Task::perform(
                async move {
                    input
                        .submit(&prompt, &url)
                        .await
                        .map_err(|err| err.user_message().to_string())
                },
                Message::PromptFinished,
            )
        }
        Message::PromptFinished(result) => {
            state.sending = false;
            match result {
                Ok(submission) => {
                    if let Err(err) = state.session.record(&submission) {
                        tracing::error!(error = %err, "failed to persist history");
                        state.notice = Some(Notice::error(err.user_message()));
                        return Task::none();
                    }
                    if submission.succeeded() {
                        state.composer = text_editor::Content::new();
                    }
                    state.notice = Some(submission.notice);
                }
                Err(err) => state.notice = Some(Notice::error(err)),
            }
            Task::none()
        }
        Message::ClearHistoryPressed => {
            state.notice = Some(match state.session.clear_history() {
                Ok(notice) => notice,
                Err(err) => Notice::error(err.user_message()),
            });
            Task::none()
        }
    }
}

fn view(state: &HookPromptApp) -> Element<'_, Message> {
    let header = column![
        text("n8n Connection").size(12).color([0.55, 0.65, 0.95]),
        text("Send Prompts to n8n").size(34),
        text(
            "Write your prompts here and send them directly to your n8n workflow or AI agent via webhooks."
        )
        .size(14),
    ]
    .spacing(6)
    .align_x(iced::Alignment::Center);

    let configure = button(text("Configure Webhook").size(14))
        .padding([8, 14])
        .style(iced::widget::button::secondary)
        .on_press(Message::ToggleWebhookPanel);

    let mut content = column![
        container(header).center_x(Length::Fill),
        container(configure).center_x(Length::Fill),
    ]
    .spacing(16)
    .width(Length::Fill);

    if state.webhook.is_open() {
        content = content.push(view_webhook_panel(state));
    }

    content = content.push(view_prompt_panel(state));

    if let Some(notice) = &state.notice {
        let color = match notice.level {
            NoticeLevel::Success => [0.55, 0.9, 0.65],
            NoticeLevel::Error => [0.95, 0.45, 0.45],
        };
        content = content.push(text(notice.message.clone()).color(color));
    }

    if !state.session.history().is_empty() {
        content = content.push(view_history_panel(state));
    }

    container(
        container(scrollable(content.padding(24)).height(Length::Fill)).style(glass_shell),
    )
    .padding(16)
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

fn view_webhook_panel(state: &HookPromptApp) -> Element<'_, Message> {
    let can_test = !state.testing && !state.webhook.url().is_empty();
    container(
        column![
            text("n8n Webhook Configuration").size(16),
            text("Enter your n8n webhook URL to connect your workflow.").size(12),
            text_input("https://n8n.example.com/webhook/...", state.webhook.url())
                .on_input(Message::WebhookUrlChanged)
                .on_submit(Message::SaveWebhookPressed)
                .padding(10),
            row![
                button(if state.testing {
                    "Testing..."
                } else {
                    "Test Webhook"
                })
                .padding([8, 12])
                .width(Length::Fill)
                .on_press_maybe(can_test.then_some(Message::TestWebhookPressed)),
                button("Save")
                    .padding([8, 12])
                    .width(Length::Fill)
                    .style(iced::widget::button::success)
                    .on_press(Message::SaveWebhookPressed),
            ]
            .spacing(10),
        ]
        .spacing(10),
    )
    .padding(16)
    .style(glass_panel)
    .width(Length::Fill)
    .into()
}

fn view_prompt_panel(state: &HookPromptApp) -> Element<'_, Message> {
    let connection = if state.session.is_configured() {
        text("● Connected to n8n").size(12).color([0.35, 0.85, 0.45])
    } else {
        text("● Webhook not configured")
            .size(12)
            .color([0.95, 0.8, 0.3])
    };
    let can_send = !state.sending && !state.prompt_text().trim().is_empty();

    container(
        column![
            text_editor(&state.composer)
                .placeholder("Write your prompt here...")
                .height(160)
                .padding(10)
                .on_action(Message::PromptEdited),
            row![
                connection,
                Space::new().width(Length::Fill),
                button(if state.sending { "Sending..." } else { "Send" })
                    .padding([10, 16])
                    .style(iced::widget::button::primary)
                    .on_press_maybe(can_send.then_some(Message::SendPressed)),
            ]
            .align_y(iced::Alignment::Center),
        ]
        .spacing(10),
    )
    .padding(16)
    .style(glass_panel)
    .width(Length::Fill)
    .into()
}

fn view_history_panel(state: &HookPromptApp) -> Element<'_, Message> {
    let entries = render_history(state.session.history()).into_iter().fold(
        column!().spacing(12).width(Length::Fill),
        |col, entry| {
            let mut card = column![
                row![
                    text("Prompt").size(13),
                    Space::new().width(Length::Fill),
                    text(entry.time).size(12),
                ]
                .align_y(iced::Alignment::Center),
                text(entry.prompt).size(14),
            ]
            .spacing(6);
            if let Some(response) = entry.response {
                card = card.push(
                    column![text("Response").size(13), text(response).size(14)].spacing(4),
                );
            }
            col.push(container(card).padding(12).style(glass_panel).width(Length::Fill))
        },
    );

    column![
        text("Recent Prompts").size(18),
        container(scrollable(entries).height(300)).width(Length::Fill),
        row![
            Space::new().width(Length::Fill),
            button(text("Clear history").size(12))
                .padding([6, 10])
                .style(iced::widget::button::text)
                .on_press(Message::ClearHistoryPressed),
        ],
    ]
    .spacing(10)
    .width(Length::Fill)
    .into()
}

fn glass_shell(_theme: &Theme) -> iced::widget::container::Style {
    iced::widget::container::Style {
        text_color: None,
        background: Some(Background::Color(Color::from_rgba(0.07, 0.10, 0.18, 0.65))),
        border: Border {
            radius: 18.0.into(),
            width: 1.0,
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.10),
        },
        shadow: Shadow::default(),
        snap: false,
    }
}

fn glass_panel(_theme: &Theme) -> iced::widget::container::Style {
    iced::widget::container::Style {
        text_color: None,
        background: Some(Background::Color(Color::from_rgba(0.10, 0.14, 0.24, 0.58))),
        border: Border {
            radius: 16.0.into(),
            width: 1.0,
            color: Color::from_rgba(1.0, 1.0, 1.0, 0.12),
        },
        shadow: Shadow::default(),
        snap: false,
    }
}
