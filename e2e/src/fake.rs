//! Scripted in-memory page for unit tests.

use crate::page::BrowserPage;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Navigate(String),
    Fill(String, String),
    Click(String),
    Screenshot(PathBuf),
    Evaluate(String),
    Close,
}

#[derive(Default)]
struct State {
    actions: Vec<Action>,
    /// Selector -> number of `is_visible` polls before it shows up.
    visible: HashMap<String, usize>,
    texts: HashMap<String, String>,
    broken: Option<String>,
}

#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<State>>,
}

impl FakePage {
    pub fn show(&self, selector: &str) {
        self.show_after(selector, 0);
    }

    pub fn show_after(&self, selector: &str, polls: usize) {
        self.state
            .lock()
            .unwrap()
            .visible
            .insert(selector.to_string(), polls);
    }

    pub fn set_text(&self, selector: &str, text: &str) {
        self.show(selector);
        self.state
            .lock()
            .unwrap()
            .texts
            .insert(selector.to_string(), text.to_string());
    }

    /// Clicking `selector` fails from now on.
    pub fn break_selector(&self, selector: &str) {
        self.state.lock().unwrap().broken = Some(selector.to_string());
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state.lock().unwrap().actions.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|action| match action {
                Action::Click(selector) => Some(selector),
                _ => None,
            })
            .collect()
    }

    fn record(&self, action: Action) {
        self.state.lock().unwrap().actions.push(action);
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(Action::Navigate(url.to_string()));
        Ok(())
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        self.record(Action::Fill(selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if self.state.lock().unwrap().broken.as_deref() == Some(selector) {
            return Err(anyhow!("element {} is detached", selector));
        }
        self.record(Action::Click(selector.to_string()));
        Ok(())
    }

    async fn is_visible(&self, selector: &str) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        Ok(match state.visible.get_mut(selector) {
            Some(0) => true,
            Some(polls) => {
                *polls -= 1;
                false
            }
            None => false,
        })
    }

    async fn text(&self, selector: &str) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .texts
            .get(selector)
            .cloned()
            .ok_or_else(|| anyhow!("no element matches {}", selector))
    }

    async fn screenshot(&self, path: &Path) -> Result<()> {
        self.record(Action::Screenshot(path.to_path_buf()));
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<serde_json::Value> {
        self.record(Action::Evaluate(script.to_string()));
        Ok(serde_json::json!(123))
    }

    async fn close(&self) -> Result<()> {
        self.record(Action::Close);
        Ok(())
    }
}

/// Hands out clones of one scripted page and counts how many were opened.
#[derive(Clone, Default)]
pub struct FakePages {
    pub page: FakePage,
    pub opened: Arc<AtomicUsize>,
}

impl FakePages {
    pub fn open(&self) -> FakePage {
        self.opened.fetch_add(1, Ordering::SeqCst);
        self.page.clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}
