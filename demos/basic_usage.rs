//! Basic usage of both bucket engines.

use array_hash::{BucketStore, ListHashTable, PackedBufferStore, PackedHashTable, StoreError};

fn main() -> Result<(), StoreError> {
    example_packed()?;
    example_list()?;
    example_single_bucket()?;
    Ok(())
}

fn example_packed() -> Result<(), StoreError> {
    println!("=== PackedHashTable (contiguous buckets) ===\n");

    let mut table: PackedHashTable<u64> = PackedHashTable::new();

    table.add("user:1001", 1001)?;
    table.add("user:1002", 1002)?;
    table.add("user:1003", 1003)?;
    // Overwrite in place; the previous value comes back.
    let previous = table.add("user:1003", 3003)?;

    println!("user:1001 = {:?}", table.get("user:1001"));
    println!("user:9999 = {:?}", table.get("user:9999"));
    println!("user:1003 was {:?}, now {:?}", previous, table.get("user:1003"));
    println!("Count: {}", table.len());
    println!("Heap bytes: {}\n", table.memory_usage());
    Ok(())
}

fn example_list() -> Result<(), StoreError> {
    println!("=== ListHashTable (linked buckets) ===\n");

    let mut table: ListHashTable<u32> = ListHashTable::with_slot_count(8);
    for (i, url) in ["http://example.com/page1", "http://example.com/page2", "http://other.com/page1"]
        .iter()
        .enumerate()
    {
        table.add(url, i as u32)?;
    }
    table.remove("http://example.com/page2");

    for (key, value) in &table {
        println!("  {} = {}", String::from_utf8_lossy(key), value.get());
    }
    println!("Count: {}\n", table.len());
    Ok(())
}

fn example_single_bucket() -> Result<(), StoreError> {
    println!("=== PackedBufferStore (one bucket) ===\n");

    let mut store: PackedBufferStore<i32> = PackedBufferStore::new();
    store.add(b"key-1", 1)?;
    println!("Encoded bytes after key-1: {}", store.size());
    store.add(b"key-2", 2)?;
    println!("Encoded bytes after key-2: {}", store.size());
    store.remove(b"key-1");
    println!("Encoded bytes after removing key-1: {}", store.size());
    println!("key-2 = {:?}", store.find(b"key-2").map(|v| v.get()));
    Ok(())
}
