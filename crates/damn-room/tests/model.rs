//! Property and scenario tests for the room model.

use damn_protocol::{ChatroomId, MemberInfo};
use damn_room::{Chatroom, UserRegistry};
use proptest::prelude::*;

const USERS: [&str; 6] = ["alice", "bob", "carl", "dana", "eve", "zed"];
const CLASSES: [&str; 4] = ["Founders", "Operators", "Members", "Banned"];

// =========================================================================
// Helpers
// =========================================================================

#[derive(Debug, Clone)]
enum Op {
    Add { room: usize, user: usize, class: usize },
    Remove { room: usize, user: usize },
    MoveAll { room: usize, src: usize, dst: usize },
    Release { room: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..2usize, 0..USERS.len(), 0..CLASSES.len())
            .prop_map(|(room, user, class)| Op::Add { room, user, class }),
        2 => (0..2usize, 0..USERS.len()).prop_map(|(room, user)| Op::Remove { room, user }),
        2 => (0..2usize, 0..CLASSES.len(), 0..CLASSES.len())
            .prop_map(|(room, src, dst)| Op::MoveAll { room, src, dst }),
        1 => (0..2usize).prop_map(|room| Op::Release { room }),
    ]
}

fn rooms() -> [Chatroom; 2] {
    ["Botdom", "Lounge"].map(|name| {
        let mut room = Chatroom::new(ChatroomId::public(name));
        room.update_privclasses("99:Founders\n75:Operators\n25:Members\n1:Banned\n");
        room
    })
}

fn info(class: &str) -> MemberInfo {
    MemberInfo {
        privclass: class.to_owned(),
        ..MemberInfo::default()
    }
}

fn apply(op: &Op, rooms: &mut [Chatroom; 2], users: &mut UserRegistry) {
    match *op {
        Op::Add { room, user, class } => rooms[room].add_member(USERS[user], &info(CLASSES[class]), users),
        Op::Remove { room, user } => {
            let _ = rooms[room].remove_member(USERS[user], users);
        }
        Op::MoveAll { room, src, dst } => {
            let _ = rooms[room].move_all(CLASSES[src], CLASSES[dst]);
        }
        Op::Release { room } => rooms[room].release_all(users),
    }
}

// =========================================================================
// Properties
// =========================================================================

/// Property: every member maps to exactly one existing class that lists it,
/// and every class lists only mapped members.
#[test]
fn prop_membership_invariant_holds() {
    proptest!(|(ops in prop::collection::vec(op_strategy(), 0..40))| {
        let mut users = UserRegistry::new();
        let mut rooms = rooms();
        for op in &ops {
            apply(op, &mut rooms, &mut users);
        }

        for room in &rooms {
            for member in room.members() {
                let class = room.privclass_of(member).expect("mapped");
                prop_assert!(room.privclass(class).is_some_and(|c| c.has_member(member)));
                let owners = room.privclasses().filter(|c| c.has_member(member)).count();
                prop_assert_eq!(owners, 1);
            }
            for class in room.privclasses() {
                for member in class.members() {
                    prop_assert_eq!(room.privclass_of(member), Some(class.name()));
                }
            }
        }
    });
}

/// Property: a user is registered iff some room lists it as a member.
#[test]
fn prop_user_registry_tracks_memberships() {
    proptest!(|(ops in prop::collection::vec(op_strategy(), 0..40))| {
        let mut users = UserRegistry::new();
        let mut rooms = rooms();
        for op in &ops {
            apply(op, &mut rooms, &mut users);
        }

        for name in USERS {
            let in_any_room = rooms.iter().any(|room| room.has_member(name));
            prop_assert_eq!(users.contains(name), in_any_room, "user {}", name);
        }
        for user in users.iter() {
            prop_assert!(user.chatrooms().next().is_some());
            for wire in user.chatrooms() {
                let room = rooms.iter().find(|room| room.wire_id() == wire).expect("known room");
                prop_assert!(room.has_member(user.name()));
            }
        }
    });
}

/// Property: move_all returns the source size and leaves the source empty.
#[test]
fn prop_move_all_moves_every_member() {
    proptest!(|(
        placements in prop::collection::vec((0..USERS.len(), 0..CLASSES.len()), 0..12),
        src in 0..CLASSES.len(),
        dst in 0..CLASSES.len(),
    )| {
        prop_assume!(src != dst);
        let mut users = UserRegistry::new();
        let [mut room, _] = rooms();
        for (user, class) in placements {
            room.add_member(USERS[user], &info(CLASSES[class]), &mut users);
        }

        let before: Vec<String> = room
            .privclass(CLASSES[src])
            .map(|c| c.members().map(str::to_owned).collect())
            .unwrap_or_default();

        let moved = room.move_all(CLASSES[src], CLASSES[dst]).expect("both classes exist");
        prop_assert_eq!(moved, before.len());
        prop_assert_eq!(room.privclass(CLASSES[src]).map(|c| c.member_count()), Some(0));
        for name in &before {
            prop_assert_eq!(room.privclass_of(name), Some(CLASSES[dst]));
        }
    });
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_process_members_maps_into_existing_classes() {
    let mut users = UserRegistry::new();
    let mut room = Chatroom::new(ChatroomId::public("Botdom"));
    room.update_privclasses("25:peanut gallery\n10:peons\n");

    room.process_members(
        "member alice\npc=peanut gallery\nmember bob\npc=peons\n",
        &mut users,
    );

    assert_eq!(room.privclass_of("alice"), Some("peanut gallery"));
    assert_eq!(room.privclass_of("bob"), Some("peons"));
    assert_eq!(room.privclasses().count(), 2);
    assert!(users.contains("alice") && users.contains("bob"));
}

#[test]
fn test_shared_user_survives_leaving_one_room() {
    let mut users = UserRegistry::new();
    let [mut botdom, mut lounge] = rooms();
    botdom.add_member("bob", &info("Members"), &mut users);
    lounge.add_member("bob", &info("Operators"), &mut users);

    botdom.release_all(&mut users);
    assert!(users.get("bob").is_some_and(|u| u.is_in("chat:Lounge")));

    lounge
        .remove_member("bob", &mut users)
        .expect("bob is in the lounge");
    assert!(users.is_empty());
}

#[test]
fn test_room_snapshot_serializes() {
    let mut users = UserRegistry::new();
    let [mut room, _] = rooms();
    room.add_member("bob", &info("Members"), &mut users);

    let json = serde_json::to_value(&room).expect("serializes");
    assert_eq!(json["id"]["name"], "Botdom");
    assert_eq!(json["members"]["bob"], "Members");
    assert_eq!(json["privclasses"]["Members"]["order"], 25);
}
