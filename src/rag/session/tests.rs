use super::*;
use crate::llm::Role;

#[test]
fn appends_in_order() {
    let mut session = ConversationSession::new();
    assert!(session.is_empty());

    session.append(ChatMessage::user("first question"));
    session.append(ChatMessage::assistant("first answer"));
    session.append(ChatMessage::user("second question"));

    assert_eq!(session.len(), 3);
    let roles: Vec<Role> = session.turns().iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
    assert_eq!(session.turns()[2].content, "second question");
}

#[test]
fn reset_clears_everything() {
    let mut session = ConversationSession::new();
    session.append(ChatMessage::user("question"));
    session.append(ChatMessage::assistant("answer"));

    session.reset();

    assert!(session.is_empty());
    assert_eq!(session.turns(), &[] as &[ChatMessage]);
}
