mod dialog_tests;

use std::sync::Arc;

use adaptive_dialog::recognizer::RegexRecognizer;
use adaptive_dialog::storage::{InMemoryScopeStorage, ScopeStorage};
use adaptive_dialog::{Activity, ActivityType, Dialog, DialogGraph, DialogManager, DialogResult};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[ctor::ctor]
fn init_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Sends activities through one manager as a single user in a single conversation.
pub struct TestConversation {
    pub manager: DialogManager,
    pub storage: Arc<InMemoryScopeStorage>,
}

impl TestConversation {
    pub fn new(root: Dialog) -> Self {
        Self::from_graph(DialogGraph::new(root).unwrap())
    }

    pub fn from_graph(graph: DialogGraph) -> Self {
        graph.validate().unwrap();
        let storage = Arc::new(InMemoryScopeStorage::new());
        let manager = DialogManager::new(graph, storage.clone() as Arc<dyn ScopeStorage>);
        Self { manager, storage }
    }

    pub async fn send(&self, activity: Activity) -> DialogResult<Vec<String>> {
        let replies = self.manager.process_turn(activity).await?;
        Ok(replies
            .into_iter()
            .map(|reply| reply.text.unwrap_or_default())
            .collect())
    }

    pub async fn say(&self, text: &str) -> Vec<String> {
        self.send(Activity::message(text)).await.unwrap()
    }

    pub async fn send_type(&self, activity_type: ActivityType) -> Vec<String> {
        self.send(Activity::new(activity_type)).await.unwrap()
    }

    pub async fn conversation_update(&self) -> Vec<String> {
        self.send(Activity::conversation_update(Vec::new()))
            .await
            .unwrap()
    }
}

pub fn regex(intents: &[(&str, &str)]) -> RegexRecognizer {
    intents
        .iter()
        .fold(RegexRecognizer::new(), |recognizer, (intent, pattern)| {
            recognizer.with_intent(*intent, *pattern).unwrap()
        })
}
