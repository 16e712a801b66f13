//! Usage collection over a deletion set.

use tracing::{debug, info};

use excise_model::{
    Cancelled, CodeModel, DescriptionLocation, ElementId, ProgressTicket, TextSearchScope,
};

use crate::containment::{default_inside_deleted, is_inside_any, InsideDeletedFilter};
use crate::deletion_set::DeletionSet;
use crate::registry::DelegateRegistry;
use crate::settings::SearchToggles;
use crate::usage::{dedup_usages, NonCodeUsage, UsageInfo};

/// Collects usages of every member of a deletion set.
///
/// Claimed members go through their delegate's search; the rest take the
/// generic reference search. Both paths then scan comments, strings and
/// non-source files when the corresponding toggle is on.
pub struct UsageCollector<'a> {
    model: &'a dyn CodeModel,
    registry: &'a DelegateRegistry,
    set: &'a DeletionSet,
    toggles: SearchToggles,
    ticket: &'a ProgressTicket,
}

impl<'a> UsageCollector<'a> {
    /// Creates a collector for one run.
    pub fn new(
        model: &'a dyn CodeModel,
        registry: &'a DelegateRegistry,
        set: &'a DeletionSet,
        toggles: SearchToggles,
        ticket: &'a ProgressTicket,
    ) -> Self {
        Self {
            model,
            registry,
            set,
            toggles,
            ticket,
        }
    }

    /// Collects and deduplicates usages.
    ///
    /// Returns `Ok(None)` when a delegate declines the search, which aborts
    /// the run.
    pub fn collect(&self) -> Result<Option<Vec<UsageInfo>>, Cancelled> {
        let default_filter = default_inside_deleted(self.set);
        let mut usages = Vec::new();

        for element in self.set.members() {
            self.ticket.check()?;
            match self.registry.claiming(self.model, element) {
                Some(delegate) => {
                    let Some(search) =
                        delegate.find_usages(self.model, element, self.set, self.ticket)?
                    else {
                        info!(
                            element = element.0,
                            delegate = delegate.name(),
                            "delegate declined usage search; aborting"
                        );
                        return Ok(None);
                    };
                    debug!(
                        element = element.0,
                        delegate = delegate.name(),
                        usages = search.usages.len(),
                        "delegate usage search finished"
                    );
                    usages.extend(search.usages);
                    let filter = search
                        .non_code
                        .inside_deleted
                        .unwrap_or_else(|| default_filter.clone());
                    for searched in search.non_code.elements_to_search {
                        self.add_non_code_usages(searched, &filter, &mut usages)?;
                    }
                }
                None => {
                    usages.extend(self.find_generic_usages(element)?);
                    if self.model.name(element).is_some() {
                        self.add_non_code_usages(element, &default_filter, &mut usages)?;
                    }
                }
            }
        }

        let usages = dedup_usages(usages);
        debug!(usages = usages.len(), "usage collection finished");
        Ok(Some(usages))
    }

    /// Plain reference search. References inside the deletion set die with
    /// their container and are not reported.
    pub fn find_generic_usages(&self, element: ElementId) -> Result<Vec<UsageInfo>, Cancelled> {
        let references = self.model.find_references(element, self.ticket)?;
        Ok(references
            .into_iter()
            .filter(|reference| !is_inside_any(self.model, reference.element, self.set.roots()))
            .map(|reference| UsageInfo::unsafe_reference(reference.element, element))
            .collect())
    }

    /// Scans for textual occurrences of `searched`'s descriptive name and
    /// records hits outside the deletion set against `searched` itself, so a
    /// hit on a satellite's name belongs to that satellite.
    pub fn add_non_code_usages(
        &self,
        searched: ElementId,
        inside_deleted: &InsideDeletedFilter,
        out: &mut Vec<UsageInfo>,
    ) -> Result<(), Cancelled> {
        let passes = [
            (
                self.toggles.search_in_comments,
                DescriptionLocation::StringsAndComments,
                TextSearchScope::CommentsAndStrings,
            ),
            (
                self.toggles.search_non_source,
                DescriptionLocation::NonSource,
                TextSearchScope::NonSource,
            ),
        ];
        for (enabled, location, scope) in passes {
            if !enabled {
                continue;
            }
            let text = self.model.description(searched, location);
            if text.is_empty() {
                continue;
            }
            for occurrence in self.model.search_text_occurrences(&text, scope, self.ticket)? {
                if inside_deleted(self.model, occurrence.element) {
                    continue;
                }
                out.push(UsageInfo::NonCode(NonCodeUsage {
                    element: occurrence.element,
                    referenced: searched,
                    range: occurrence.range,
                }));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use excise_model::{ProgressSource, Workspace, WorkspaceBuilder};

    struct Fixture {
        ws: Workspace,
        field: ElementId,
        method: ElementId,
        outside_ref: ElementId,
        inside_ref: ElementId,
        comment: ElementId,
        readme: ElementId,
    }

    fn fixture() -> Fixture {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "Counter.java");
        let class = b.class(file, "Counter");
        let field = b.field(class, "count");
        let method = b.method(class, "reset");
        let inside_ref = b.reference(method, field);
        let comment = b.comment(class, "// count is never negative");
        let other_file = b.source_file(None, "Report.java");
        let report = b.class(other_file, "Report");
        let outside_ref = b.reference(report, field);
        let readme = b.text_file(None, "README.md", "The count field tracks hits.");
        Fixture {
            ws: b.finish(),
            field,
            method,
            outside_ref,
            inside_ref,
            comment,
            readme,
        }
    }

    #[test]
    fn generic_path_reports_only_outside_references() {
        let fx = fixture();
        let registry = DelegateRegistry::new();
        let set = DeletionSet::new(&fx.ws, [fx.field, fx.method]);
        let ticket = ProgressTicket::detached();
        let collector = UsageCollector::new(&fx.ws, &registry, &set, SearchToggles::NONE, &ticket);

        let usages = collector.collect().unwrap().unwrap();
        assert_eq!(usages.len(), 1);
        assert_eq!(usages[0].element(), fx.outside_ref);
        assert!(!usages[0].is_safe_delete());
        assert!(usages.iter().all(|usage| usage.element() != fx.inside_ref));
    }

    #[test]
    fn non_code_scanning_honours_toggles() {
        let fx = fixture();
        let registry = DelegateRegistry::new();
        let set = DeletionSet::new(&fx.ws, [fx.field]);
        let ticket = ProgressTicket::detached();

        let comments_only = SearchToggles {
            search_in_comments: true,
            search_non_source: false,
        };
        let collector = UsageCollector::new(&fx.ws, &registry, &set, comments_only, &ticket);
        let usages = collector.collect().unwrap().unwrap();
        let non_code: Vec<ElementId> = usages
            .iter()
            .filter(|usage| usage.is_non_code())
            .map(UsageInfo::element)
            .collect();
        assert_eq!(non_code, vec![fx.comment]);

        let collector =
            UsageCollector::new(&fx.ws, &registry, &set, SearchToggles::default(), &ticket);
        let usages = collector.collect().unwrap().unwrap();
        assert!(usages.iter().any(|usage| usage.element() == fx.readme));
    }

    #[test]
    fn occurrences_inside_the_set_are_dropped() {
        let fx = fixture();
        let registry = DelegateRegistry::new();
        let class = fx.ws.parent(fx.field).unwrap();
        let set = DeletionSet::new(&fx.ws, [class, fx.field]);
        let ticket = ProgressTicket::detached();
        let collector =
            UsageCollector::new(&fx.ws, &registry, &set, SearchToggles::default(), &ticket);

        let usages = collector.collect().unwrap().unwrap();
        assert!(usages.iter().all(|usage| usage.element() != fx.comment));
        assert!(usages.iter().any(|usage| usage.element() == fx.readme));
    }

    #[test]
    fn collecting_twice_is_stable() {
        let fx = fixture();
        let registry = DelegateRegistry::with_defaults();
        let set = DeletionSet::new(&fx.ws, [fx.field]);
        let ticket = ProgressTicket::detached();
        let collector =
            UsageCollector::new(&fx.ws, &registry, &set, SearchToggles::default(), &ticket);

        let keys = |usages: Vec<UsageInfo>| {
            let mut keys: Vec<_> = usages
                .iter()
                .map(|usage| (usage.element(), usage.range(), usage.is_safe_delete()))
                .collect();
            keys.sort_by_key(|(element, range, _)| (*element, range.map(|r| r.start())));
            keys
        };
        let first = keys(collector.collect().unwrap().unwrap());
        let second = keys(collector.collect().unwrap().unwrap());
        assert_eq!(first, second);
    }

    #[test]
    fn satellite_name_hits_belong_to_the_satellite() {
        let mut b = WorkspaceBuilder::new();
        let file = b.source_file(None, "Switch.java");
        let class = b.class(file, "Switch");
        let field = b.field(class, "on");
        let getter = b.method(class, "isOn");
        let other_file = b.source_file(None, "Panel.java");
        let panel = b.class(other_file, "Panel");
        let comment = b.comment(panel, "// call isOn first");
        let ws = b.finish();

        let registry = DelegateRegistry::with_defaults();
        let set = DeletionSet::new(&ws, [field, getter]);
        let ticket = ProgressTicket::detached();
        let toggles = SearchToggles {
            search_in_comments: true,
            search_non_source: false,
        };
        let collector = UsageCollector::new(&ws, &registry, &set, toggles, &ticket);

        let usages = collector.collect().unwrap().unwrap();
        let hits: Vec<(ElementId, ElementId)> = usages
            .iter()
            .filter(|usage| usage.is_non_code())
            .map(|usage| (usage.element(), usage.referenced()))
            .collect();
        assert_eq!(hits, vec![(comment, getter)]);
    }

    #[test]
    fn cancelled_ticket_aborts_collection() {
        let fx = fixture();
        let registry = DelegateRegistry::new();
        let set = DeletionSet::new(&fx.ws, [fx.field]);
        let source = ProgressSource::new();
        let ticket = source.begin();
        source.cancel();
        let collector =
            UsageCollector::new(&fx.ws, &registry, &set, SearchToggles::default(), &ticket);
        assert_eq!(collector.collect().unwrap_err(), Cancelled);
    }
}
