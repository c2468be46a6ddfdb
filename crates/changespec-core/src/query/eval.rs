use super::{Expr, Special};
use crate::changespec::ChangeSpec;

/// A record prepared for evaluating one or more expressions against it.
pub struct EvalContext<'a> {
    pub changespec: &'a ChangeSpec,
    text: String,
    lower: String,
}

impl<'a> EvalContext<'a> {
    pub fn new(changespec: &'a ChangeSpec) -> Self {
        let text = changespec.searchable_text();
        let lower = text.to_lowercase();
        Self {
            changespec,
            text,
            lower,
        }
    }

    pub fn eval(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Term {
                text,
                case_sensitive: true,
            } => self.text.contains(text.as_str()),
            Expr::Term { text, .. } => self.lower.contains(&text.to_lowercase()),
            Expr::Special(special) => self.special(*special),
            Expr::Not(inner) => !self.eval(inner),
            Expr::And(left, right) => self.eval(left) && self.eval(right),
            Expr::Or(left, right) => self.eval(left) || self.eval(right),
        }
    }

    fn special(&self, special: Special) -> bool {
        let cs = self.changespec;
        match special {
            Special::Error => cs.has_error_suffix(),
            Special::RunningAgent => cs.has_running_agent(),
            Special::RunningProcess => cs.has_running_hook(),
            Special::Any => cs.has_error_suffix() || cs.has_running_agent() || cs.has_running_hook(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::{filter, parse};
    use crate::changespec::{ChangeSpec, CommentEntry};
    use crate::entry::{add_commit, CommitEntryRef};
    use crate::hook::HookStatus;
    use crate::status::BaseStatus;
    use crate::suffix::StatusSuffix;

    fn spec(name: &str, status: BaseStatus) -> ChangeSpec {
        let mut cs = ChangeSpec::new(name, "");
        cs.status.base = status;
        cs
    }

    fn names<'a>(specs: &[&'a ChangeSpec]) -> Vec<&'a str> {
        specs.iter().map(|cs| cs.name.as_str()).collect()
    }

    #[test]
    fn feature_and_drafted_scenario() {
        let specs = vec![
            spec("feature_a", BaseStatus::Drafted),
            spec("feature_b", BaseStatus::Mailed),
            spec("bugfix_c", BaseStatus::Drafted),
        ];
        let expr = parse(r#""feature" AND "Drafted""#).unwrap();
        assert_eq!(names(&filter(&expr, &specs)), ["feature_a"]);
    }

    #[test]
    fn case_sensitivity() {
        let specs = vec![ChangeSpec::new("Feature_X", "Refactor Parser")];
        assert_eq!(filter(&parse("feature_x").unwrap(), &specs).len(), 1);
        assert_eq!(filter(&parse(r#"c"feature_x""#).unwrap(), &specs).len(), 0);
        assert_eq!(filter(&parse(r#"c"Feature_X""#).unwrap(), &specs).len(), 1);
        assert_eq!(filter(&parse("parser").unwrap(), &specs).len(), 1);
    }

    #[test]
    fn not_and_or_semantics() {
        let specs = vec![
            spec("alpha", BaseStatus::Wip),
            spec("beta", BaseStatus::Mailed),
            spec("gamma", BaseStatus::Submitted),
        ];
        let q = |s: &str| names(&filter(&parse(s).unwrap(), &specs)).join(",");
        assert_eq!(q("NOT alpha"), "beta,gamma");
        assert_eq!(q("alpha OR gamma"), "alpha,gamma");
        assert_eq!(q("(alpha OR beta) mailed"), "beta");
        assert_eq!(q("a"), "alpha,beta,gamma");
    }

    #[test]
    fn special_shorthands() {
        let mut errored = ChangeSpec::new("errored", "");
        errored.comments.push(CommentEntry {
            reviewer: "bob".to_string(),
            file_path: "c.json".to_string(),
            suffix: Some(StatusSuffix::error("unresolved")),
        });

        let mut running = ChangeSpec::new("running", "");
        add_commit(&mut running.commits, "first");
        running.add_hook("make test").unwrap();
        running.hook_mut("make test").unwrap().record_status(
            CommitEntryRef::regular(1),
            HookStatus::Running,
            None,
            None,
        );

        let mut agent = ChangeSpec::new("agent", "");
        agent.comments.push(CommentEntry {
            reviewer: "carol".to_string(),
            file_path: "d.json".to_string(),
            suffix: Some(StatusSuffix::new("251018_101500")),
        });

        let clean = ChangeSpec::new("clean", "");
        let specs = vec![errored, running, agent, clean];
        let q = |s: &str| names(&filter(&parse(s).unwrap(), &specs)).join(",");

        assert_eq!(q("!!!"), "errored");
        assert_eq!(q("!!"), "running,agent,clean");
        assert_eq!(q("$$$"), "running");
        assert_eq!(q("@@@"), "agent");
        assert_eq!(q("!@$"), "errored,running,agent");
        assert_eq!(q("NOT !@$"), "clean");
    }
}
