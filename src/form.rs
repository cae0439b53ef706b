use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// A form submission. Unless a listener prevents the default, the form navigates away.
#[derive(Default)]
pub struct SubmitEvent {
    default_prevented: AtomicBool,
}

impl SubmitEvent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.store(true, Ordering::Relaxed);
    }

    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented.load(Ordering::Relaxed)
    }
}

pub trait InputField: Send + Sync {
    fn value(&self) -> String;
}

pub trait OutputElement: Send + Sync {
    fn set_text(&self, text: String);
}

#[derive(Default)]
pub struct TextField {
    value: Mutex<String>,
}

impl TextField {
    pub fn set_value(&self, value: impl Into<String>) {
        *self.value.lock().unwrap() = value.into();
    }
}

impl InputField for TextField {
    fn value(&self) -> String {
        self.value.lock().unwrap().clone()
    }
}

#[derive(Default)]
pub struct TextElement {
    text: Mutex<String>,
}

impl TextElement {
    pub fn text(&self) -> String {
        self.text.lock().unwrap().clone()
    }
}

impl OutputElement for TextElement {
    fn set_text(&self, text: String) {
        *self.text.lock().unwrap() = text;
    }
}
