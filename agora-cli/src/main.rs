//! Interactive terminal shell for the agora group chat.
//!
//! The shell owns nothing but stdin and stdout: every intent is a command
//! sent to the node, every line printed comes back as a node event or a
//! command reply.

use agora_node::{Node, NodeConfig, NodeError, NodeEvent, NotifyLevel};
use tokio::io::{AsyncBufReadExt, BufReader};

const BOLD: &str = "\x1b[1m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BLUE: &str = "\x1b[34m";
const RESET: &str = "\x1b[0m";

/// One parsed shell line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Discover,
    Create { name: String, peers: Vec<usize> },
    Join(String),
    Send(String),
    Delete(String),
    Leave(String),
    ListPeers,
    ListRooms,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let trimmed = line.trim();
    let (head, rest) = trimmed
        .split_once(char::is_whitespace)
        .map(|(head, rest)| (head, rest.trim()))
        .unwrap_or((trimmed, ""));

    match head {
        "discover" => Ok(ShellCommand::Discover),
        "create" => {
            let mut parts = rest.split_whitespace();
            let name = parts
                .next()
                .ok_or("usage: create <room> <peer#> [peer#…]")?;
            let peers = parts
                .map(|p| {
                    p.parse::<usize>()
                        .map_err(|_| format!("'{p}' is not a peer number"))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ShellCommand::Create {
                name: name.to_string(),
                peers,
            })
        }
        "join" if !rest.is_empty() => Ok(ShellCommand::Join(rest.to_string())),
        "join" => Err("usage: join <room>".into()),
        "send" if !rest.is_empty() => Ok(ShellCommand::Send(rest.to_string())),
        "send" => Err("usage: send <text>".into()),
        "delete" if !rest.is_empty() => Ok(ShellCommand::Delete(rest.to_string())),
        "delete" => Err("usage: delete <room>".into()),
        "leave" if !rest.is_empty() => Ok(ShellCommand::Leave(rest.to_string())),
        "leave" => Err("usage: leave <room>".into()),
        "list" => match rest {
            "peers" => Ok(ShellCommand::ListPeers),
            "rooms" => Ok(ShellCommand::ListRooms),
            _ => Err("usage: list peers | list rooms".into()),
        },
        "help" => Ok(ShellCommand::Help),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}' (try 'help')")),
    }
}

fn print_event(event: NodeEvent) {
    match event {
        NodeEvent::Notification { level, text } => {
            let color = match level {
                NotifyLevel::Info => BLUE,
                NotifyLevel::Success => GREEN,
                NotifyLevel::Warning => YELLOW,
                NotifyLevel::Error => RED,
            };
            println!("{BOLD}{color}{text}{RESET}");
        }
        NodeEvent::TextDelivered { author, text, .. } => {
            println!("{BOLD}{author}{RESET}: {text}");
        }
    }
}

fn print_error(error: &NodeError) {
    if let NodeError::SameRoomName { name, candidates } = error {
        println!("{BOLD}{RED}several rooms are named '{name}':{RESET}");
        for desc in candidates {
            println!("  {} ({} members)", desc.id, desc.members.len());
        }
        return;
    }
    println!("{BOLD}{RED}{error}{RESET}");
}

fn print_help() {
    println!("{BOLD}available commands:{RESET}");
    println!("  discover                 look for peers on the LAN");
    println!("  create <room> <peer#…>   open a room with the numbered peers");
    println!("  join <room>              display a room");
    println!("  send <text>              write into the displayed room");
    println!("  delete <room>            delete a room you created");
    println!("  leave <room>             stop displaying a room");
    println!("  list peers | list rooms  show what this node knows");
    println!("  quit                     announce departure and exit");
}

async fn run_shell(node: &Node) -> Result<(), NodeError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    print_help();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(usage) => {
                println!("{BOLD}{YELLOW}{usage}{RESET}");
                continue;
            }
        };

        match command {
            ShellCommand::Discover => {
                node.discover().await?;
                println!("{BOLD}{BLUE}looking for peers…{RESET}");
            }
            ShellCommand::Create { name, peers } => match node.create_room(&name, peers).await {
                Ok(desc) => println!(
                    "{BOLD}{GREEN}room '{}' created with {} members{RESET}",
                    desc.name,
                    desc.members.len()
                ),
                Err(e) => print_error(&e),
            },
            ShellCommand::Join(name) => match node.enter_room(&name).await {
                Ok(view) => {
                    println!("{BOLD}── {} ──{RESET}", view.desc.name);
                    for (author, text) in view.messages {
                        println!("{BOLD}{author}{RESET}: {text}");
                    }
                }
                Err(e) => print_error(&e),
            },
            ShellCommand::Send(text) => {
                if let Err(e) = node.send_text(text).await {
                    print_error(&e);
                }
            }
            ShellCommand::Delete(name) => match node.delete_room(&name).await {
                Ok(()) => println!("{BOLD}{GREEN}room '{name}' deleted{RESET}"),
                Err(e) => print_error(&e),
            },
            ShellCommand::Leave(name) => match node.leave_room(&name).await {
                Ok(()) => println!("{BOLD}{BLUE}left '{name}'{RESET}"),
                Err(e) => print_error(&e),
            },
            ShellCommand::ListPeers => {
                let peers = node.peers().await?;
                if peers.is_empty() {
                    println!("no peers discovered yet, try 'discover'");
                }
                for (index, peer) in peers.iter().enumerate() {
                    println!("{BOLD}{}{RESET}  {} @ {}", index + 1, peer.username, peer.addr);
                }
            }
            ShellCommand::ListRooms => {
                let rooms = node.rooms().await?;
                if rooms.created.is_empty() && rooms.participating.is_empty() {
                    println!("there are no rooms yet");
                }
                if !rooms.created.is_empty() {
                    println!("{BOLD}created rooms:{RESET}");
                    for desc in &rooms.created {
                        println!("  {} ({} members)", desc.name, desc.members.len());
                    }
                }
                if !rooms.participating.is_empty() {
                    println!("{BOLD}participating rooms:{RESET}");
                    for desc in &rooms.participating {
                        println!("  {} ({} members)", desc.name, desc.members.len());
                    }
                }
            }
            ShellCommand::Help => print_help(),
            ShellCommand::Quit => {
                println!("{BOLD}{BLUE}announcing departure…{RESET}");
                node.shutdown().await?;
                println!("{BOLD}farewell, space cowboy…{RESET}");
                break;
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let username = match std::env::args().nth(1) {
        Some(name) => name,
        None => {
            println!("{BOLD}welcome to the causally ordered group chat!{RESET}");
            println!("please enter a nickname:");
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            match lines.next_line().await {
                Ok(Some(line)) if !line.trim().is_empty() => line.trim().to_string(),
                _ => {
                    eprintln!("a nickname is required");
                    std::process::exit(1);
                }
            }
        }
    };

    let mut node = match Node::start(NodeConfig::with_username(username)).await {
        Ok(node) => node,
        Err(e) => {
            eprintln!("could not join the network: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "{BOLD}{GREEN}you are {} @ {}{RESET}",
        node.local_peer().username,
        node.local_peer().addr
    );

    let mut events = node.take_events().expect("first take");
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(event);
        }
    });

    // a first sweep so 'list peers' has something to show early
    if let Err(e) = node.discover().await {
        log::warn!("initial discovery failed: {e}");
    }

    if let Err(e) = run_shell(&node).await {
        eprintln!("shell stopped: {e}");
        std::process::exit(1);
    }
}
