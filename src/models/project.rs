use serde::{Deserialize, Serialize};

/// The five documentation steps an SK project moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum WorkflowStep {
    Planning,
    Approval,
    Resolution,
    DesignVerification,
    Withdrawal,
}

impl WorkflowStep {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            WorkflowStep::Planning => "planning",
            WorkflowStep::Approval => "approval",
            WorkflowStep::Resolution => "resolution",
            WorkflowStep::DesignVerification => "design-verification",
            WorkflowStep::Withdrawal => "withdrawal",
        }
    }

    pub(crate) fn parse(s: &str) -> Option<WorkflowStep> {
        match s.to_lowercase().as_str() {
            "planning" | "plan" => Some(WorkflowStep::Planning),
            "approval" => Some(WorkflowStep::Approval),
            "resolution" => Some(WorkflowStep::Resolution),
            "design-verification" | "design" => Some(WorkflowStep::DesignVerification),
            "withdrawal" => Some(WorkflowStep::Withdrawal),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [WorkflowStep] {
        &[
            WorkflowStep::Planning,
            WorkflowStep::Approval,
            WorkflowStep::Resolution,
            WorkflowStep::DesignVerification,
            WorkflowStep::Withdrawal,
        ]
    }
}

impl std::fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A document attached to one workflow step. Content is opaque text
/// produced outside this tool; it is stored and shown, never parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ProjectDocument {
    pub(crate) step: WorkflowStep,
    pub(crate) content: String,
    pub(crate) completed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Project {
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) documents: Vec<ProjectDocument>,
    #[serde(default)]
    pub(crate) created_at: String,
}

impl Project {
    pub(crate) fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            documents: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub(crate) fn document(&self, step: WorkflowStep) -> Option<&ProjectDocument> {
        self.documents.iter().find(|d| d.step == step)
    }

    /// Attach or replace the document for a step. A replaced document
    /// resets the step's completion.
    pub(crate) fn set_document(&mut self, step: WorkflowStep, content: String) {
        match self.documents.iter_mut().find(|d| d.step == step) {
            Some(doc) => {
                doc.content = content;
                doc.completed = false;
            }
            None => self.documents.push(ProjectDocument {
                step,
                content,
                completed: false,
            }),
        }
    }

    /// Mark a step complete. Returns false when the step has no document yet.
    pub(crate) fn complete_step(&mut self, step: WorkflowStep) -> bool {
        match self.documents.iter_mut().find(|d| d.step == step) {
            Some(doc) => {
                doc.completed = true;
                true
            }
            None => false,
        }
    }

    pub(crate) fn is_step_complete(&self, step: WorkflowStep) -> bool {
        self.document(step).map(|d| d.completed).unwrap_or(false)
    }

    pub(crate) fn completed_steps(&self) -> usize {
        self.documents.iter().filter(|d| d.completed).count()
    }
}
