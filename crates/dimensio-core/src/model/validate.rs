//! Structural validation of a [`Project`].

use super::{FrameId, LayerId, Project};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// The invariant a [`Violation`] breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    /// Width or height below zero.
    NegativeExtent,
    /// NaN or infinite position, extent or radius.
    NonFiniteGeometry,
    /// A corner radius below zero or above half the shorter side.
    RadiusOutOfRange,
    /// A frame stored under an id that is not its own.
    DuplicateFrameId,
    DuplicateLayerId,
    /// A frame's `layer_id` names no layer.
    MissingLayer,
    /// A layer lists a frame that does not exist.
    DanglingMember,
    /// A layer lists a frame that belongs to a different layer.
    MembershipMismatch,
    /// A frame is listed more than once across all layers.
    MultipleMembership,
    /// A frame is listed by no layer.
    OrphanFrame,
    /// The selection names a frame that does not exist.
    DanglingActiveFrame,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rule::NegativeExtent => "negative width or height",
            Rule::NonFiniteGeometry => "non-finite geometry",
            Rule::RadiusOutOfRange => "corner radius out of range",
            Rule::DuplicateFrameId => "duplicate frame id",
            Rule::DuplicateLayerId => "duplicate layer id",
            Rule::MissingLayer => "owning layer does not exist",
            Rule::DanglingMember => "layer lists a missing frame",
            Rule::MembershipMismatch => "layer lists a frame owned by another layer",
            Rule::MultipleMembership => "frame listed more than once",
            Rule::OrphanFrame => "frame not listed by any layer",
            Rule::DanglingActiveFrame => "active frame does not exist",
        };
        f.write_str(text)
    }
}

/// What a violation is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    Frame(FrameId),
    Layer(LayerId),
    Project,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Frame(id) => write!(f, "frame {id}"),
            Subject::Layer(id) => write!(f, "layer {id}"),
            Subject::Project => f.write_str("project"),
        }
    }
}

/// A single broken invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub subject: Subject,
    pub rule: Rule,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.rule)
    }
}

/// Outcome of [`validate`]. Empty means the project is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Whether any violation breaks `rule`.
    pub fn has(&self, rule: Rule) -> bool {
        self.violations.iter().any(|v| v.rule == rule)
    }

    /// `Ok(())` when valid, otherwise the report itself as the error.
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.is_valid() { Ok(()) } else { Err(self) }
    }

    fn push(&mut self, subject: Subject, rule: Rule) {
        self.violations.push(Violation { subject, rule });
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            return f.write_str("no violations");
        }
        for (i, violation) in self.violations.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{violation}")?;
        }
        Ok(())
    }
}

/// Check every structural invariant of `project`.
///
/// Violations are reported in a stable order: sorted by subject, then rule.
pub fn validate(project: &Project) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut layer_ids = HashSet::new();
    for layer in &project.layers {
        if !layer_ids.insert(layer.id) {
            report.push(Subject::Layer(layer.id), Rule::DuplicateLayerId);
        }
    }

    for (&key, frame) in &project.frames {
        let subject = Subject::Frame(key);
        if key != frame.id {
            report.push(subject, Rule::DuplicateFrameId);
        }

        let geometry = [frame.x, frame.y, frame.width, frame.height];
        let finite = geometry.iter().chain(frame.radius.values().iter()).all(|v| v.is_finite());
        if !finite {
            report.push(subject, Rule::NonFiniteGeometry);
        }
        if frame.width < 0.0 || frame.height < 0.0 {
            report.push(subject, Rule::NegativeExtent);
        } else if finite && !frame.radius.fits(frame.width, frame.height) {
            report.push(subject, Rule::RadiusOutOfRange);
        }

        if !layer_ids.contains(&frame.layer_id) {
            report.push(subject, Rule::MissingLayer);
        }
    }

    let mut listed: HashMap<FrameId, usize> = HashMap::new();
    for layer in &project.layers {
        for &member in &layer.frame_ids {
            *listed.entry(member).or_default() += 1;
            match project.frames.get(&member) {
                None => report.push(Subject::Layer(layer.id), Rule::DanglingMember),
                Some(frame) if frame.layer_id != layer.id => {
                    report.push(Subject::Layer(layer.id), Rule::MembershipMismatch)
                }
                Some(_) => {}
            }
        }
    }

    for &id in project.frames.keys() {
        match listed.get(&id).copied().unwrap_or(0) {
            0 => report.push(Subject::Frame(id), Rule::OrphanFrame),
            1 => {}
            _ => report.push(Subject::Frame(id), Rule::MultipleMembership),
        }
    }

    if let Some(active) = project.active_frame_id {
        if !project.frames.contains_key(&active) {
            report.push(Subject::Project, Rule::DanglingActiveFrame);
        }
    }

    report
        .violations
        .sort_by(|a, b| (a.subject, a.rule).cmp(&(b.subject, b.rule)));
    report.violations.dedup();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CornerRadii, Frame, FrameColor, Layer};
    use kurbo::Rect;
    use uuid::Uuid;

    fn valid_project() -> (Project, FrameId, LayerId) {
        let mut project = Project::new();
        let layer = Layer::new("Layer 1", FrameColor::default());
        let layer_id = layer.id();
        project.insert_layer(layer);
        let frame = Frame::new(layer_id, Rect::new(0.0, 0.0, 100.0, 60.0));
        let frame_id = frame.id();
        project.insert_frame(frame);
        (project, frame_id, layer_id)
    }

    fn rules(project: &Project) -> Vec<Rule> {
        validate(project).violations().iter().map(|v| v.rule).collect()
    }

    #[test]
    fn test_valid_project() {
        let (project, _, _) = valid_project();
        let report = validate(&project);
        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_negative_extent() {
        let (mut project, id, _) = valid_project();
        if let Some(f) = project.frame_mut(id) {
            f.width = -1.0;
        }
        assert_eq!(rules(&project), vec![Rule::NegativeExtent]);
    }

    #[test]
    fn test_non_finite_geometry() {
        let (mut project, id, _) = valid_project();
        if let Some(f) = project.frame_mut(id) {
            f.x = f64::NAN;
        }
        assert_eq!(rules(&project), vec![Rule::NonFiniteGeometry]);
    }

    #[test]
    fn test_radius_out_of_range() {
        let (mut project, id, _) = valid_project();
        if let Some(f) = project.frame_mut(id) {
            f.radius = CornerRadii::uniform(31.0);
        }
        assert_eq!(rules(&project), vec![Rule::RadiusOutOfRange]);

        if let Some(f) = project.frame_mut(id) {
            f.radius = CornerRadii { tl: -1.0, ..CornerRadii::ZERO };
        }
        assert_eq!(rules(&project), vec![Rule::RadiusOutOfRange]);
    }

    #[test]
    fn test_missing_layer_and_orphan() {
        let (mut project, id, _) = valid_project();
        project.layers.clear();
        let report = validate(&project);
        assert!(report.has(Rule::MissingLayer));
        assert!(report.has(Rule::OrphanFrame));
        assert!(report.violations().iter().all(|v| v.subject == Subject::Frame(id)));
    }

    #[test]
    fn test_dangling_member() {
        let (mut project, _, layer) = valid_project();
        if let Some(l) = project.layer_mut(layer) {
            l.push_member(Uuid::new_v4());
        }
        assert_eq!(rules(&project), vec![Rule::DanglingMember]);
    }

    #[test]
    fn test_membership_mismatch() {
        let (mut project, id, _) = valid_project();
        let mut other = Layer::new("Layer 2", FrameColor::palette(1));
        other.push_member(id);
        project.insert_layer(other);
        let report = validate(&project);
        assert!(report.has(Rule::MembershipMismatch));
        assert!(report.has(Rule::MultipleMembership));
    }

    #[test]
    fn test_duplicate_ids() {
        let (mut project, id, layer) = valid_project();
        let twin = Layer::reconstruct(layer, "Twin".into(), FrameColor::default(), Vec::new());
        project.insert_layer(twin);
        let stray = project.frame(id).cloned();
        if let Some(mut stray) = stray {
            stray.id = Uuid::new_v4();
            project.frames.insert(id, stray.clone());
            project.frames.insert(stray.id, Frame { id, ..stray });
        }
        let report = validate(&project);
        assert!(report.has(Rule::DuplicateLayerId));
        assert!(report.has(Rule::DuplicateFrameId));
    }

    #[test]
    fn test_dangling_active_frame() {
        let (mut project, _, _) = valid_project();
        project.active_frame_id = Some(Uuid::new_v4());
        let report = validate(&project);
        assert_eq!(
            report.violations(),
            &[Violation {
                subject: Subject::Project,
                rule: Rule::DanglingActiveFrame
            }]
        );
        assert!(report.to_string().contains("active frame does not exist"));
    }
}
