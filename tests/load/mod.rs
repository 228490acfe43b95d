mod concurrent_enqueue;
