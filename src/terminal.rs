use std::future::Future;
use std::io;
use std::sync::Arc;

use colored::Colorize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;

use crate::form::{OutputElement, SubmitEvent, TextElement, TextField};
use crate::handler::{ERROR_MESSAGE, Outcome, SubmissionHandler};

/// Output element rendered to stdout.
#[derive(Default)]
pub struct TerminalOutput {
    element: TextElement,
}

impl TerminalOutput {
    pub fn text(&self) -> String {
        self.element.text()
    }
}

impl OutputElement for TerminalOutput {
    fn set_text(&self, text: String) {
        if text == ERROR_MESSAGE {
            println!("{}", text.bright_red());
        } else {
            println!("{}", text.bright_green());
        }
        self.element.set_text(text);
    }
}

pub struct Terminal {
    handler: Arc<SubmissionHandler>,
    field: Arc<TextField>,
    tasks: Vec<JoinHandle<Outcome>>,
}

impl Terminal {
    pub const fn new(handler: Arc<SubmissionHandler>, field: Arc<TextField>) -> Self {
        Self { handler, field, tasks: Vec::new() }
    }

    /// Submits every line of `input` until it ends or `shutdown` resolves. Requests keep running
    /// in the background while further lines are read.
    pub async fn run<R: AsyncBufRead + Unpin>(
        &mut self,
        input: R,
        shutdown: impl Future<Output = io::Result<()>>,
    ) -> io::Result<()> {
        let mut lines = input.lines();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = &mut shutdown => {
                    result?;
                    log::warn!("Ctrl+C received");
                    break;
                }
                line = lines.next_line() => match line? {
                    Some(line) => self.submit(line),
                    None => break,
                },
            }
            self.tasks.retain(|task| !task.is_finished());
        }

        Ok(())
    }

    fn submit(&mut self, value: String) {
        self.field.set_value(value);

        let event = SubmitEvent::new();
        let submission = self.handler.on_submit(&event);
        if !event.is_default_prevented() {
            log::warn!("submit event was not intercepted, the form navigated away");
        }

        let handler = self.handler.clone();
        self.tasks.push(tokio::spawn(async move { handler.complete(submission).await }));
    }

    /// Waits for every pending submission.
    pub async fn drain(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        let mut last_task_count = 0;

        while !self.tasks.is_empty() {
            let task_count = self.tasks.iter().filter(|task| !task.is_finished()).count();
            if task_count != 0 && task_count != last_task_count {
                log::info!("waiting for {task_count} task(s) to finish…");
                last_task_count = task_count;
            }

            match self.tasks.remove(0).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => log::error!("submission task failed: {err}"),
            }
        }

        outcomes
    }

    /// Submits each URL in order, waiting for one to finish before the next. Returns whether all
    /// of them produced a prediction.
    pub async fn submit_all(&mut self, urls: impl IntoIterator<Item = String>) -> bool {
        let mut all_predicted = true;

        for url in urls {
            self.field.set_value(url);
            let outcome = self.handler.handle(&SubmitEvent::new()).await;
            all_predicted &= matches!(outcome, Outcome::Predicted(_));
        }

        all_predicted
    }
}
