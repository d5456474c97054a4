use tinymovr::endpoints;
use tinymovr::StreamExt;
use tracing_subscriber;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let adapter = tinymovr::can::get_adapter().unwrap();
    let stream = adapter.recv();
    tokio::pin!(stream);

    while let Some(frame) = stream.next().await {
        let id: u32 = frame.id.into();
        let (node_id, ep_id) = endpoints::split_id(frame.id);
        let name = endpoints::table().by_ep_id(ep_id).map_or("?", |ep| ep.name);

        println!(
            "[{}]\t0x{:03x}\tnode {}\t{}\t{}{}",
            frame.bus,
            id,
            node_id,
            name,
            if frame.rtr { "RTR " } else { "" },
            hex::encode(&frame.data)
        );
    }
}
