/// Tests for the publish protocol
#[cfg(test)]
mod tests {
    use crate::types::WikiTarget;
    use crate::wiki::{
        PAGE_NOT_FOUND_FAULT, Page, PageAction, PublishError, Publisher, RpcError, SessionState, WikiRpc,
        XmlRpcValue,
    };
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory wiki recording every call it receives
    #[derive(Default)]
    struct FakeWiki {
        pages: RefCell<HashMap<(String, String), Page>>,
        calls: RefCell<Vec<String>>,
        stored: RefCell<Vec<Page>>,
        reject_login: bool,
        lookup_fault: Option<String>,
        fail_store: bool,
        fail_logout: bool,
        next_id: RefCell<u32>,
    }

    impl FakeWiki {
        fn with_page(self, space: &str, title: &str, id: &str) -> Self {
            let mut page = Page::default();
            page.set("id", id);
            page.set("space", space);
            page.set("title", title);
            page.set("version", XmlRpcValue::Int(7));
            page.set("content", "old content");
            self.pages.borrow_mut().insert((space.to_string(), title.to_string()), page);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn fault(message: &str) -> RpcError {
            RpcError::Fault { code: 0, message: message.to_string() }
        }
    }

    impl WikiRpc for FakeWiki {
        fn login(&self, username: &str, password: &str) -> Result<String, RpcError> {
            self.calls.borrow_mut().push(format!("login:{}", username));
            if self.reject_login || password != "secret" {
                return Err(Self::fault("com.atlassian.confluence.rpc.AuthenticationFailedException"));
            }
            Ok("token-1".to_string())
        }

        fn logout(&self, token: &str) -> Result<(), RpcError> {
            self.calls.borrow_mut().push(format!("logout:{}", token));
            if self.fail_logout {
                return Err(Self::fault("java.lang.Exception: session already expired"));
            }
            Ok(())
        }

        fn get_page(&self, token: &str, space: &str, title: &str) -> Result<Page, RpcError> {
            assert_eq!(token, "token-1");
            self.calls.borrow_mut().push(format!("getPage:{}/{}", space, title));
            if let Some(message) = &self.lookup_fault {
                if !title.starts_with("Parent") {
                    return Err(Self::fault(message));
                }
            }
            self.pages.borrow().get(&(space.to_string(), title.to_string())).cloned().ok_or_else(|| {
                Self::fault(&format!(
                    "java.lang.Exception: com.atlassian.confluence.rpc.RemoteException: {}.",
                    PAGE_NOT_FOUND_FAULT
                ))
            })
        }

        fn store_page(&self, token: &str, page: &Page) -> Result<Page, RpcError> {
            assert_eq!(token, "token-1");
            self.calls.borrow_mut().push(format!("storePage:{}", page.title().unwrap_or("?")));
            if self.fail_store {
                return Err(Self::fault("java.lang.Exception: version conflict"));
            }
            self.stored.borrow_mut().push(page.clone());

            let mut saved = page.clone();
            if saved.id().is_none() {
                *self.next_id.borrow_mut() += 1;
                saved.set("id", format!("new-{}", self.next_id.borrow()).as_str());
            }
            Ok(saved)
        }
    }

    fn target() -> WikiTarget {
        WikiTarget {
            url: "https://wiki.example.com/rpc/xmlrpc".to_string(),
            username: "bot".to_string(),
            password: "secret".to_string(),
            insecure: false,
        }
    }

    fn wiki_with_parent() -> FakeWiki {
        FakeWiki::default().with_page("OPS", "Parent Stats", "100")
    }

    #[test]
    fn test_missing_page_is_created_under_parent() {
        let publisher = Publisher::new(wiki_with_parent(), &target());
        assert_eq!(publisher.state(), SessionState::Disconnected);

        let action = publisher.publish("Weekly", "Parent Stats", "OPS", "{chart:|width=800}\n").unwrap();
        assert_eq!(action, PageAction::Created);

        let wiki = publisher.rpc();
        assert_eq!(
            wiki.calls(),
            vec![
                "login:bot",
                "getPage:OPS/Parent Stats",
                "getPage:OPS/Weekly",
                "storePage:Weekly",
                "logout:token-1",
            ]
        );

        let stored = wiki.stored.borrow();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id(), None);
        assert_eq!(stored[0].parent_id().as_deref(), Some("100"));
        assert_eq!(stored[0].get("space"), Some(&XmlRpcValue::String("OPS".to_string())));
        assert_eq!(stored[0].content(), Some("{chart:|width=800}\n"));
        assert_eq!(publisher.state(), SessionState::Closed);
    }

    #[test]
    fn test_existing_page_keeps_its_attributes() {
        let wiki = wiki_with_parent().with_page("OPS", "Weekly", "555");
        let publisher = Publisher::new(wiki, &target());

        let action = publisher.publish("Weekly", "Parent Stats", "OPS", "new content").unwrap();
        assert_eq!(action, PageAction::Updated);

        let stored = publisher.rpc().stored.borrow();
        assert_eq!(stored[0].id().as_deref(), Some("555"));
        assert_eq!(stored[0].get("version"), Some(&XmlRpcValue::Int(7)));
        assert_eq!(stored[0].content(), Some("new content"));
        assert_eq!(stored[0].parent_id(), None, "existing pages are not re-parented");
    }

    #[test]
    fn test_other_lookup_fault_skips_store() {
        let wiki = FakeWiki { lookup_fault: Some("java.lang.Exception: database is down".to_string()), ..wiki_with_parent() };
        let publisher = Publisher::new(wiki, &target());

        let err = publisher.publish("Weekly", "Parent Stats", "OPS", "x").unwrap_err();
        match &err {
            PublishError::PageLookup { title, source, .. } => {
                assert_eq!(title, "Weekly");
                assert!(!source.is_page_not_found());
            }
            other => panic!("expected page lookup error, got {:?}", other),
        }

        let calls = publisher.rpc().calls();
        assert!(!calls.iter().any(|c| c.starts_with("storePage")), "store must not run: {:?}", calls);
        assert_eq!(calls.last().map(String::as_str), Some("logout:token-1"));
    }

    #[test]
    fn test_rejected_login_is_fatal() {
        let wiki = FakeWiki { reject_login: true, ..wiki_with_parent() };
        let publisher = Publisher::new(wiki, &target());

        let err = publisher.publish("Weekly", "Parent Stats", "OPS", "x").unwrap_err();
        assert!(matches!(err, PublishError::Login(_)));
        assert_eq!(publisher.rpc().calls(), vec!["login:bot"]);
        assert_eq!(publisher.state(), SessionState::Disconnected);
    }

    #[test]
    fn test_missing_parent_is_fatal() {
        let publisher = Publisher::new(FakeWiki::default(), &target());

        let err = publisher.publish("Weekly", "Nowhere", "OPS", "x").unwrap_err();
        assert!(matches!(err, PublishError::ParentLookup { .. }), "got {:?}", err);
        assert!(err.to_string().contains("Nowhere"));
    }

    #[test]
    fn test_store_failure_is_reported() {
        let wiki = FakeWiki { fail_store: true, ..wiki_with_parent() };
        let publisher = Publisher::new(wiki, &target());

        let err = publisher.publish("Weekly", "Parent Stats", "OPS", "x").unwrap_err();
        assert!(matches!(err, PublishError::Store { .. }));
        assert_eq!(publisher.state(), SessionState::Closed);
    }

    #[test]
    fn test_logout_failure_after_store_is_reported() {
        let wiki = FakeWiki { fail_logout: true, ..wiki_with_parent() };
        let publisher = Publisher::new(wiki, &target());

        let err = publisher.publish("Weekly", "Parent Stats", "OPS", "x").unwrap_err();
        match &err {
            PublishError::Logout(source) => assert!(source.to_string().contains("session already expired")),
            other => panic!("expected logout error, got {:?}", other),
        }
        // The page was still written before the session closed
        assert_eq!(publisher.rpc().stored.borrow().len(), 1);
        assert_eq!(publisher.state(), SessionState::Closed);
    }

    #[test]
    fn test_store_failure_wins_over_logout_failure() {
        let wiki = FakeWiki { fail_store: true, fail_logout: true, ..wiki_with_parent() };
        let publisher = Publisher::new(wiki, &target());

        let err = publisher.publish("Weekly", "Parent Stats", "OPS", "x").unwrap_err();
        assert!(matches!(err, PublishError::Store { .. }), "got {:?}", err);
        assert_eq!(publisher.rpc().calls().last().map(String::as_str), Some("logout:token-1"));
    }

    #[test]
    fn test_each_publish_opens_its_own_session() {
        let publisher = Publisher::new(wiki_with_parent(), &target());
        publisher.publish("A", "Parent Stats", "OPS", "a").unwrap();
        publisher.publish("B", "Parent Stats", "OPS", "b").unwrap();

        let calls = publisher.rpc().calls();
        assert_eq!(calls.iter().filter(|c| c.starts_with("login")).count(), 2);
        assert_eq!(calls.iter().filter(|c| c.starts_with("logout")).count(), 2);
    }

    #[test]
    fn test_not_found_detection_needs_fault_text() {
        let not_found = RpcError::Fault {
            code: 0,
            message: format!("java.lang.Exception: com.atlassian.confluence.rpc.RemoteException: {}.", PAGE_NOT_FOUND_FAULT),
        };
        assert!(not_found.is_page_not_found());
        assert!(!RpcError::Fault { code: 0, message: "boom".to_string() }.is_page_not_found());
        assert!(!RpcError::Http { status: 404, body: PAGE_NOT_FOUND_FAULT.to_string() }.is_page_not_found());
    }

    #[test]
    fn test_new_child_page_fields() {
        let page = Page::new_child("OPS", "Weekly", "42");
        assert_eq!(page.title(), Some("Weekly"));
        assert_eq!(page.parent_id().as_deref(), Some("42"));
        assert_eq!(page.id(), None);
        assert!(Page::from_value(XmlRpcValue::Int(1)).is_err());
    }
}
