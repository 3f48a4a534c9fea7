//! Columnar commission reports (Optima, MB, Aliado).
//!
//! Expected stream shape, one value per line:
//!
//! ```text
//! REF       <refs...>
//! FECHA     <kind codes: AD, CH, ...>
//! TIPO      <first policy segment per row>
//! POLIZA    <remaining policy segments, segment-major>
//!           <insured names>
//! ASEGURADO ...
//! %COMISION <commission per row>
//! GANADOS   <paid/discounted, ignored>
//! ```

use serde::Deserialize;

use crate::align::{compact, keep_indices, project, truncate_len, NameFilter, RowValidator};
use crate::amount::parse_amount;
use crate::carrier::{Carrier, StatementParser};
use crate::carriers::strings;
use crate::composite::CompositeKey;
use crate::lines::{is_digits, locate, normalize, Anchor};
use crate::model::{DropReason, ParseOutcome, ParseStats};
use crate::segment::{digit_run_after, digit_run_before, slice_between};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnarAnchors {
    pub reference: Anchor,
    pub date: Anchor,
    pub kind: Anchor,
    pub policy: Anchor,
    pub insured: Anchor,
    pub percent: Anchor,
    pub earned: Anchor,
}

impl Default for ColumnarAnchors {
    fn default() -> Self {
        Self {
            reference: Anchor::exact("REF"),
            date: Anchor::exact("FECHA"),
            kind: Anchor::exact("TIPO"),
            policy: Anchor::exact("POLIZA"),
            insured: Anchor::exact("ASEGURADO"),
            percent: Anchor::contains("%COMISION"),
            earned: Anchor::exact("GANADOS"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ColumnarConfig {
    pub anchors: ColumnarAnchors,
    #[serde(flatten)]
    pub key: CompositeKey,
    /// Kind codes that mark non-commission postings.
    pub excluded_kinds: Vec<String>,
    pub names: NameFilter,
    /// Falls back to the carrier's own minimum when unset.
    pub min_policy_len: Option<usize>,
    pub project_names_by_kind: bool,
    /// Accept `"01 49192 2 NAME"` lines after the policy anchor.
    pub inline_policy_lines: Option<bool>,
}

impl Default for ColumnarConfig {
    fn default() -> Self {
        Self {
            anchors: ColumnarAnchors::default(),
            key: CompositeKey::default(),
            excluded_kinds: strings(&["CH"]),
            names: NameFilter::default(),
            min_policy_len: None,
            project_names_by_kind: true,
            inline_policy_lines: None,
        }
    }
}

pub struct ColumnarParser {
    carrier: Carrier,
    config: ColumnarConfig,
    validator: RowValidator,
    inline: bool,
}

impl ColumnarParser {
    pub fn new(carrier: Carrier, config: ColumnarConfig) -> Self {
        let min_policy_len = config.min_policy_len.unwrap_or(match carrier {
            Carrier::Mb | Carrier::Aliado => 10,
            _ => 1,
        });
        let inline = config.inline_policy_lines.unwrap_or(carrier == Carrier::Aliado);
        let validator = RowValidator::new(min_policy_len, config.names.clone());
        Self {
            carrier,
            config,
            validator,
            inline,
        }
    }

    /// Policy identifiers plus raw name candidates, in row order.
    fn policies_and_names(
        &self,
        lines: &[String],
        policy_idx: usize,
        names_end: usize,
        stats: &mut ParseStats,
    ) -> (Vec<String>, Vec<String>) {
        let before = digit_run_before(lines, policy_idx);
        let after = digit_run_after(lines, policy_idx, names_end);

        if after.is_empty() && self.inline {
            let (tokens, names) = self.inline_rows(slice_between(lines, Some(policy_idx), Some(names_end)));
            let mut all = before;
            all.extend(tokens);
            stats.column("policy_tokens", all.len());
            return (self.rebuild(&all, stats), names);
        }

        let mut tokens = before;
        tokens.extend(after.iter().cloned());
        stats.column("policy_tokens", tokens.len());
        let names = slice_between(lines, Some(policy_idx + after.len()), Some(names_end)).to_vec();
        (self.rebuild(&tokens, stats), names)
    }

    /// Lines of the form `01 49192 2 NAME`: the leading numeric tokens carry
    /// the trailing policy segments for one row, the rest is the name.
    ///
    /// Tokens come back segment-major so they zip like the columnar layout.
    fn inline_rows(&self, mixed: &[String]) -> (Vec<String>, Vec<String>) {
        let per_row = self.config.key.segments().saturating_sub(1);
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); per_row];
        let mut names = Vec::new();

        for line in mixed {
            let words: Vec<&str> = line.split_whitespace().collect();
            let numeric = words.iter().take_while(|w| is_digits(w)).count();
            if per_row == 0 || numeric < per_row {
                continue;
            }
            for (column, token) in columns.iter_mut().zip(&words[..per_row]) {
                column.push(token.to_string());
            }
            let name = words[numeric..].join(" ");
            if !name.is_empty() {
                names.push(name);
            }
        }
        (columns.into_iter().flatten().collect(), names)
    }

    fn rebuild(&self, tokens: &[String], stats: &mut ParseStats) -> Vec<String> {
        match self.config.key.reconstruct(tokens) {
            Ok(ids) => ids,
            Err(e) => {
                log::warn!("[{}] {e}; emitting no rows", self.carrier);
                stats.drop_row(DropReason::Unreconstructable);
                Vec::new()
            }
        }
    }
}

impl StatementParser for ColumnarParser {
    fn carrier(&self) -> Carrier {
        self.carrier
    }

    fn parse(&self, text: &str) -> ParseOutcome {
        let lines = normalize(text);
        let anchors = &self.config.anchors;

        let date_idx = locate(&lines, &anchors.date);
        let kind_idx = locate(&lines, &anchors.kind);
        let policy_idx = locate(&lines, &anchors.policy);
        let insured_idx = locate(&lines, &anchors.insured);
        let percent_idx = locate(&lines, &anchors.percent);
        let earned_idx = locate(&lines, &anchors.earned);

        let missing: Vec<String> = [
            (&anchors.policy, policy_idx),
            (&anchors.insured, insured_idx),
            (&anchors.percent, percent_idx),
            (&anchors.earned, earned_idx),
        ]
        .iter()
        .filter(|(_, idx)| idx.is_none())
        .map(|(a, _)| a.label().to_string())
        .collect();
        let (policy_idx, insured_idx) = match (policy_idx, insured_idx) {
            (Some(policy), Some(insured)) if missing.is_empty() => (policy, insured),
            _ => return ParseOutcome::missing_anchors(self.carrier, lines.len(), missing),
        };

        let mut out = ParseOutcome::new(self.carrier, lines.len());

        // Type codes print between the date and type labels.
        let kinds = slice_between(&lines, date_idx, kind_idx);
        let (policies, candidates) = self.policies_and_names(&lines, policy_idx, insured_idx, &mut out.stats);

        // The run after the earned label is paid/discounted and never used.
        let commissions: Vec<i64> = slice_between(&lines, percent_idx, earned_idx)
            .iter()
            .map(|v| parse_amount(v))
            .collect();

        let keep = keep_indices(kinds, &self.config.excluded_kinds);
        if let Some(keep) = &keep {
            out.stats.drop_many(DropReason::ExcludedKind, kinds.len() - keep.len());
        }
        let commissions = project(&commissions, keep.as_deref());

        let blanked = self.config.names.blank_invalid(&candidates);
        let names = if self.config.project_names_by_kind {
            compact(project(&blanked, keep.as_deref()))
        } else {
            compact(blanked)
        };

        let refs = slice_between(&lines, locate(&lines, &anchors.reference), date_idx);
        out.stats.column("refs", refs.len());
        out.stats.column("kinds", kinds.len());
        out.stats.column("policies", policies.len());
        out.stats.column("name_candidates", candidates.len());
        out.stats.column("names", names.len());
        out.stats.column("commissions", commissions.len());

        let n = truncate_len(&[policies.len(), names.len(), commissions.len()]);
        log::debug!(
            "[{}] policies={} names={} commissions={} taking={n}",
            self.carrier,
            policies.len(),
            names.len(),
            commissions.len(),
        );

        for i in 0..n {
            self.validator.emit(&mut out, &policies[i], &names[i], commissions[i]);
        }
        out
    }
}
