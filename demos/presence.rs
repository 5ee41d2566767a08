//! Example of using presence channels for tracking online users.
//!
//! The loopback transport stands in for a native SDK: the driver calls play
//! the server side.

use pusher_native::{CallbackListener, LoopbackTransport, NativeMember, Pusher, PusherOptions};
use serde_json::json;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let transport = Arc::new(LoopbackTransport::new());
    let options = PusherOptions::new()
        .host("localhost")
        .ws_port(6001)
        .encrypted(false)
        .authorizer("http://localhost:3000/pusher/auth");

    let client = Pusher::new("app-key", options, transport.factory())?;
    println!("✓ Client created for {}", transport.endpoint());

    let (connected, _) = tokio::join!(client.connect(), async {
        tokio::task::yield_now().await;
        transport.establish();
    });
    connected?;
    println!("✓ Connected");

    let listener = CallbackListener::new()
        .on_event(|event| println!("{} on {}: {}", event.event_name, event.channel, event.data))
        .on_member_information_received(|channel, members| {
            println!("Joined {} with {} member(s)", channel, members.len());
            for member in members {
                println!("  {} {}", member.user_id, member.user_info);
            }
        })
        .member_subscribed(|channel, member| {
            println!("Member joined {}: {} ({})", channel, member.user_id, member.user_info)
        })
        .member_unsubscribed(|channel, member| println!("Member left {}: {}", channel, member.user_id))
        .build();

    let (binding, _) = tokio::join!(client.subscribe("presence-chat-room", "message", listener), async {
        while !transport.has_channel("presence-chat-room") {
            tokio::task::yield_now().await;
        }
        transport.accept_presence(
            "presence-chat-room",
            vec![
                NativeMember::new("alice", r#"{"name":"Alice"}"#),
                NativeMember::new("bob", r#"{"name":"Bob"}"#),
            ],
        );
    });
    let binding = binding?;
    println!("✓ Subscribed (binding {})", binding);

    transport.member_joined("presence-chat-room", NativeMember::new("carol", r#"{"name":"Carol"}"#));
    transport.publish("presence-chat-room", "message", r#"{"text":"hello"}"#);
    transport.member_left("presence-chat-room", NativeMember::new("bob", ""));

    client
        .trigger("presence-chat-room", "typing", &json!({"user": "alice"}))
        .await?;
    for event in transport.sent_events("presence-chat-room") {
        println!("Sent {}: {}", event.event_name, event.data);
    }

    println!("Online: {:?}", client.members("presence-chat-room")?);

    client.unsubscribe("presence-chat-room", None)?;
    client.disconnect();
    println!("✓ Disconnected");

    Ok(())
}
